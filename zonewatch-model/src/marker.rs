use std::fmt::Write as _;

use crate::zone::TrustZone;

/// Origin URL stamped on markers created without a known download source.
pub const DEFAULT_HOST_URL: &str = "about:internet";

/// Contents of a file's origin-marker side-channel.
///
/// The `host_url` is opaque: carried verbatim across rewrites, never
/// interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneMarker {
    pub zone: TrustZone,
    pub host_url: Option<String>,
}

impl ZoneMarker {
    pub fn new(zone: TrustZone) -> Self {
        Self {
            zone,
            host_url: None,
        }
    }

    /// Parse the `[ZoneTransfer]` wire format.
    ///
    /// Returns `None` when no `ZoneId=` line parses to an integer in
    /// `0..=4`; malformed content reads as "no determinable marker".
    pub fn parse(content: &str) -> Option<ZoneMarker> {
        let mut zone = None;
        let mut host_url = None;

        for line in content.split(['\r', '\n']).filter(|l| !l.is_empty()) {
            if let Some(raw) = strip_prefix_ignore_case(line, "ZoneId=") {
                zone = raw
                    .trim()
                    .parse::<i64>()
                    .ok()
                    .and_then(|id| TrustZone::from_id(id).ok());
            } else if let Some(raw) = strip_prefix_ignore_case(line, "HostUrl=")
            {
                host_url = Some(raw.to_string());
            }
        }

        zone.map(|zone| ZoneMarker { zone, host_url })
    }

    /// Render the marker back into its wire format.
    ///
    /// A missing `host_url` falls back to the [`DEFAULT_HOST_URL`]
    /// placeholder so the stream always carries an origin field.
    pub fn to_wire(&self) -> String {
        let mut out = String::new();
        let _ = write!(out, "[ZoneTransfer]\r\n");
        let _ = write!(out, "ZoneId={}\r\n", self.zone.id());
        let _ = write!(
            out,
            "HostUrl={}\r\n",
            self.host_url.as_deref().unwrap_or(DEFAULT_HOST_URL)
        );
        out
    }
}

fn strip_prefix_ignore_case<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    match line.get(..prefix.len()) {
        Some(head) if head.eq_ignore_ascii_case(prefix) => {
            Some(&line[prefix.len()..])
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_canonical_stream() {
        let marker = ZoneMarker::parse(
            "[ZoneTransfer]\r\nZoneId=3\r\nHostUrl=https://example.com/setup.exe\r\n",
        )
        .unwrap();
        assert_eq!(marker.zone, TrustZone::Internet);
        assert_eq!(
            marker.host_url.as_deref(),
            Some("https://example.com/setup.exe")
        );
    }

    #[test]
    fn parses_case_insensitive_keys_and_bare_newlines() {
        let marker =
            ZoneMarker::parse("[ZoneTransfer]\nzoneid=2\nhosturl=about:internet\n")
                .unwrap();
        assert_eq!(marker.zone, TrustZone::Trusted);
    }

    #[test]
    fn malformed_zone_reads_as_absent() {
        assert!(ZoneMarker::parse("[ZoneTransfer]\nZoneId=garbage\n").is_none());
        assert!(ZoneMarker::parse("[ZoneTransfer]\nZoneId=9\n").is_none());
        assert!(ZoneMarker::parse("").is_none());
        assert!(ZoneMarker::parse("[ZoneTransfer]\nHostUrl=x\n").is_none());
    }

    #[test]
    fn wire_round_trip_preserves_host_url() {
        let marker = ZoneMarker {
            zone: TrustZone::Intranet,
            host_url: Some("https://intranet.corp/tool.msi".into()),
        };
        let parsed = ZoneMarker::parse(&marker.to_wire()).unwrap();
        assert_eq!(parsed, marker);
    }

    #[test]
    fn wire_falls_back_to_placeholder_origin() {
        let wire = ZoneMarker::new(TrustZone::Internet).to_wire();
        assert!(wire.contains("HostUrl=about:internet"));
    }
}
