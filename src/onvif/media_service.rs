//! Media-channel responses
//!
//! Two fixed profiles ("main" and "sub") carrying the configured
//! resolution, framerate and bitrate of each stream variant, stream-URI
//! resolution against the relay, and a single video source.

use super::types::{wants_sub_stream, MediaMethod};
use super::xml::soap_envelope;
use super::EmulatorContext;
use crate::config_store::StreamVariant;

/// Dispatch one classified media-channel request
pub fn respond(ctx: &EmulatorContext, method: MediaMethod, body: &str) -> String {
    match method {
        MediaMethod::Profiles => profiles(ctx),
        MediaMethod::StreamUri => stream_uri(ctx, wants_sub_stream(body)),
        MediaMethod::VideoSources => video_sources(ctx),
    }
}

fn profile_fragment(token: &str, name: &str, variant: &StreamVariant) -> String {
    format!(
        r#"      <trt:Profiles token="{token}" fixed="true">
        <tt:Name>{name}</tt:Name>
        <tt:VideoSourceConfiguration token="video_src_cfg">
          <tt:Name>VideoSource</tt:Name>
          <tt:UseCount>2</tt:UseCount>
          <tt:SourceToken>video_src</tt:SourceToken>
          <tt:Bounds x="0" y="0" width="{w}" height="{h}"/>
        </tt:VideoSourceConfiguration>
        <tt:VideoEncoderConfiguration token="encoder_{token}">
          <tt:Name>{name}Encoder</tt:Name>
          <tt:UseCount>1</tt:UseCount>
          <tt:Encoding>H264</tt:Encoding>
          <tt:Resolution><tt:Width>{w}</tt:Width><tt:Height>{h}</tt:Height></tt:Resolution>
          <tt:Quality>4</tt:Quality>
          <tt:RateControl>
            <tt:FrameRateLimit>{fps}</tt:FrameRateLimit>
            <tt:EncodingInterval>1</tt:EncodingInterval>
            <tt:BitrateLimit>{bitrate}</tt:BitrateLimit>
          </tt:RateControl>
        </tt:VideoEncoderConfiguration>
      </trt:Profiles>"#,
        token = token,
        name = name,
        w = variant.width,
        h = variant.height,
        fps = variant.framerate,
        bitrate = variant.bitrate_kbps,
    )
}

fn profiles(ctx: &EmulatorContext) -> String {
    soap_envelope(&format!(
        "    <trt:GetProfilesResponse>\n{}\n{}\n    </trt:GetProfilesResponse>",
        profile_fragment("main", "MainStream", &ctx.camera.main),
        profile_fragment("sub", "SubStream", &ctx.camera.sub),
    ))
}

fn stream_uri(ctx: &EmulatorContext, sub: bool) -> String {
    soap_envelope(&format!(
        r#"    <trt:GetStreamUriResponse>
      <trt:MediaUri>
        <tt:Uri>{uri}</tt:Uri>
        <tt:InvalidAfterConnect>false</tt:InvalidAfterConnect>
        <tt:InvalidAfterReboot>false</tt:InvalidAfterReboot>
        <tt:Timeout>PT60S</tt:Timeout>
      </trt:MediaUri>
    </trt:GetStreamUriResponse>"#,
        uri = ctx.stream_uri(sub),
    ))
}

fn video_sources(ctx: &EmulatorContext) -> String {
    soap_envelope(&format!(
        r#"    <trt:GetVideoSourcesResponse>
      <trt:VideoSources token="video_src">
        <tt:Framerate>{fps}</tt:Framerate>
        <tt:Resolution><tt:Width>{w}</tt:Width><tt:Height>{h}</tt:Height></tt:Resolution>
      </trt:VideoSources>
    </trt:GetVideoSourcesResponse>"#,
        fps = ctx.camera.main.framerate,
        w = ctx.camera.main.width,
        h = ctx.camera.main.height,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config_store::{Camera, CameraStatus, IpMode, Settings};

    fn ctx() -> EmulatorContext {
        let camera = Camera {
            id: 1,
            name: "Gate".into(),
            path_name: "gate".into(),
            host: "cam1".into(),
            port: 554,
            username: String::new(),
            password: String::new(),
            path_main: "/s1".into(),
            path_sub: Some("/s2".into()),
            onvif_port: 8081,
            onvif_username: "admin".into(),
            onvif_password: "admin".into(),
            mac: "a2:11:22:33:44:55".into(),
            main: StreamVariant {
                width: 1920,
                height: 1080,
                framerate: 25,
                bitrate_kbps: 4096,
                transcode: false,
            },
            sub: StreamVariant {
                width: 640,
                height: 360,
                framerate: 15,
                bitrate_kbps: 512,
                transcode: false,
            },
            virtual_interface: false,
            parent_interface: None,
            ip_mode: IpMode::Dhcp,
            static_ip: None,
            static_mask: None,
            static_gateway: None,
            autostart: false,
            status: CameraStatus::Running,
            assigned_ip: None,
        };
        EmulatorContext::new(
            camera,
            Settings {
                server_ip: "192.168.1.10".into(),
                rtsp_port: 8554,
                ..Default::default()
            },
        )
    }

    #[test]
    fn profiles_carry_both_variants() {
        let xml = respond(&ctx(), MediaMethod::Profiles, "");
        assert!(xml.contains(r#"token="main""#));
        assert!(xml.contains(r#"token="sub""#));
        assert!(xml.contains("<tt:Width>1920</tt:Width>"));
        assert!(xml.contains("<tt:Width>640</tt:Width>"));
        assert!(xml.contains("<tt:BitrateLimit>512</tt:BitrateLimit>"));
    }

    #[test]
    fn stream_uri_defaults_to_main() {
        let xml = respond(
            &ctx(),
            MediaMethod::StreamUri,
            "<GetStreamUri><ProfileToken>main</ProfileToken></GetStreamUri>",
        );
        assert!(xml.contains("rtsp://192.168.1.10:8554/gate_main"));
    }

    #[test]
    fn stream_uri_honors_sub_marker() {
        let xml = respond(
            &ctx(),
            MediaMethod::StreamUri,
            "<GetStreamUri><ProfileToken>sub</ProfileToken></GetStreamUri>",
        );
        assert!(xml.contains("rtsp://192.168.1.10:8554/gate_sub"));
    }
}
