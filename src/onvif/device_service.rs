//! Device-channel responses
//!
//! Every method produces a complete fixed-schema document populated from
//! the camera's current attributes.

use super::types::DeviceMethod;
use super::xml::{soap_envelope, xml_escape};
use super::EmulatorContext;

/// Dispatch one classified device-channel request
pub fn respond(ctx: &EmulatorContext, method: DeviceMethod) -> String {
    match method {
        DeviceMethod::DeviceInformation => device_information(ctx),
        DeviceMethod::Capabilities => capabilities(ctx),
        DeviceMethod::Services => services(ctx),
        DeviceMethod::SystemDateAndTime => system_date_and_time(),
        DeviceMethod::NetworkInterfaces => network_interfaces(ctx),
    }
}

fn device_information(ctx: &EmulatorContext) -> String {
    soap_envelope(&format!(
        r#"    <tds:GetDeviceInformationResponse>
      <tds:Manufacturer>Virtucam</tds:Manufacturer>
      <tds:Model>{model}</tds:Model>
      <tds:FirmwareVersion>{version}</tds:FirmwareVersion>
      <tds:SerialNumber>{serial}</tds:SerialNumber>
      <tds:HardwareId>{serial}</tds:HardwareId>
    </tds:GetDeviceInformationResponse>"#,
        model = xml_escape(&ctx.camera.name),
        version = env!("CARGO_PKG_VERSION"),
        serial = ctx.camera.serial_number(),
    ))
}

fn capabilities(ctx: &EmulatorContext) -> String {
    soap_envelope(&format!(
        r#"    <tds:GetCapabilitiesResponse>
      <tds:Capabilities>
        <tt:Device>
          <tt:XAddr>{device}</tt:XAddr>
          <tt:Network>
            <tt:IPFilter>false</tt:IPFilter>
            <tt:ZeroConfiguration>false</tt:ZeroConfiguration>
          </tt:Network>
          <tt:System>
            <tt:DiscoveryResolve>false</tt:DiscoveryResolve>
            <tt:DiscoveryBye>false</tt:DiscoveryBye>
            <tt:RemoteDiscovery>false</tt:RemoteDiscovery>
          </tt:System>
        </tt:Device>
        <tt:Media>
          <tt:XAddr>{media}</tt:XAddr>
          <tt:StreamingCapabilities>
            <tt:RTPMulticast>false</tt:RTPMulticast>
            <tt:RTP_TCP>true</tt:RTP_TCP>
            <tt:RTP_RTSP_TCP>true</tt:RTP_RTSP_TCP>
          </tt:StreamingCapabilities>
        </tt:Media>
      </tds:Capabilities>
    </tds:GetCapabilitiesResponse>"#,
        device = ctx.device_service_url(),
        media = ctx.media_service_url(),
    ))
}

fn services(ctx: &EmulatorContext) -> String {
    soap_envelope(&format!(
        r#"    <tds:GetServicesResponse>
      <tds:Service>
        <tds:Namespace>http://www.onvif.org/ver10/device/wsdl</tds:Namespace>
        <tds:XAddr>{device}</tds:XAddr>
        <tds:Version><tt:Major>2</tt:Major><tt:Minor>40</tt:Minor></tds:Version>
      </tds:Service>
      <tds:Service>
        <tds:Namespace>http://www.onvif.org/ver10/media/wsdl</tds:Namespace>
        <tds:XAddr>{media}</tds:XAddr>
        <tds:Version><tt:Major>2</tt:Major><tt:Minor>40</tt:Minor></tds:Version>
      </tds:Service>
    </tds:GetServicesResponse>"#,
        device = ctx.device_service_url(),
        media = ctx.media_service_url(),
    ))
}

fn system_date_and_time() -> String {
    let now = chrono::Utc::now();
    soap_envelope(&format!(
        r#"    <tds:GetSystemDateAndTimeResponse>
      <tds:SystemDateAndTime>
        <tt:DateTimeType>NTP</tt:DateTimeType>
        <tt:DaylightSavings>false</tt:DaylightSavings>
        <tt:UTCDateTime>
          <tt:Time><tt:Hour>{h}</tt:Hour><tt:Minute>{min}</tt:Minute><tt:Second>{s}</tt:Second></tt:Time>
          <tt:Date><tt:Year>{y}</tt:Year><tt:Month>{mon}</tt:Month><tt:Day>{d}</tt:Day></tt:Date>
        </tt:UTCDateTime>
      </tds:SystemDateAndTime>
    </tds:GetSystemDateAndTimeResponse>"#,
        h = now.format("%H"),
        min = now.format("%M"),
        s = now.format("%S"),
        y = now.format("%Y"),
        mon = now.format("%m"),
        d = now.format("%d"),
    ))
}

fn network_interfaces(ctx: &EmulatorContext) -> String {
    soap_envelope(&format!(
        r#"    <tds:GetNetworkInterfacesResponse>
      <tds:NetworkInterfaces token="eth0">
        <tt:Enabled>true</tt:Enabled>
        <tt:Info>
          <tt:Name>eth0</tt:Name>
          <tt:HwAddress>{mac}</tt:HwAddress>
          <tt:MTU>1500</tt:MTU>
        </tt:Info>
        <tt:IPv4>
          <tt:Enabled>true</tt:Enabled>
          <tt:Config>
            <tt:Manual><tt:Address>{ip}</tt:Address><tt:PrefixLength>24</tt:PrefixLength></tt:Manual>
            <tt:DHCP>false</tt:DHCP>
          </tt:Config>
        </tt:IPv4>
      </tds:NetworkInterfaces>
    </tds:GetNetworkInterfacesResponse>"#,
        mac = ctx.camera.mac,
        ip = ctx.endpoint_ip(),
    ))
}
