//! Minimal XML helpers for the ONVIF control plane
//!
//! Only the specific shapes the emulator needs are handled; there is no
//! general SOAP/WSDL tooling here. Extraction is namespace-agnostic
//! because recorders prefix tags with whatever alias their toolkit picked.

/// Extract the text value of a tag, tolerating any namespace prefix
pub fn extract_xml_value(xml: &str, tag: &str) -> Option<String> {
    // `<tag>` without prefix, then `:tag>` with any prefix
    let plain = format!("<{}>", tag);
    if let Some(start) = xml.find(plain.as_str()) {
        let content_start = start + plain.len();
        if let Some(end) = xml[content_start..].find("</") {
            let value = xml[content_start..content_start + end].trim().to_string();
            if !value.is_empty() {
                return Some(value);
            }
        }
    }

    let prefixed = format!(":{}>", tag);
    if let Some(start) = xml.find(prefixed.as_str()) {
        let content_start = start + prefixed.len();
        if let Some(end) = xml[content_start..].find("</") {
            let value = xml[content_start..content_start + end].trim().to_string();
            if !value.is_empty() {
                return Some(value);
            }
        }
    }

    None
}

/// Escape text content for embedding in an XML document
pub fn xml_escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Wrap a body fragment in the fixed SOAP 1.2 envelope with the ONVIF
/// namespaces the emulator responds in
pub fn soap_envelope(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<s:Envelope xmlns:s="http://www.w3.org/2003/05/soap-envelope" xmlns:tds="http://www.onvif.org/ver10/device/wsdl" xmlns:trt="http://www.onvif.org/ver10/media/wsdl" xmlns:tt="http://www.onvif.org/ver10/schema">
  <s:Body>
{}
  </s:Body>
</s:Envelope>"#,
        body
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_plain_and_prefixed_tags() {
        let xml = "<Envelope><a:MessageID>urn:uuid:42</a:MessageID></Envelope>";
        assert_eq!(
            extract_xml_value(xml, "MessageID").as_deref(),
            Some("urn:uuid:42")
        );

        let xml = "<MessageID>abc</MessageID>";
        assert_eq!(extract_xml_value(xml, "MessageID").as_deref(), Some("abc"));
    }

    #[test]
    fn missing_tag_returns_none() {
        assert!(extract_xml_value("<a>1</a>", "MessageID").is_none());
    }

    #[test]
    fn escape_covers_xml_metacharacters() {
        assert_eq!(xml_escape(r#"a<b>&"c'"#), "a&lt;b&gt;&amp;&quot;c&apos;");
    }

    #[test]
    fn envelope_carries_soap12_namespace() {
        let env = soap_envelope("<x/>");
        assert!(env.contains("http://www.w3.org/2003/05/soap-envelope"));
        assert!(env.contains("<x/>"));
    }
}
