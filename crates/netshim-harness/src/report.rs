//! Serializable views of netshim results for JSON and plain output.

use serde::Serialize;

use netshim::AddrInfo;

#[must_use]
pub fn family_name(family: i32) -> String {
    match family {
        libc::AF_UNSPEC => "unspec".to_string(),
        libc::AF_INET => "inet".to_string(),
        libc::AF_INET6 => "inet6".to_string(),
        libc::AF_UNIX => "unix".to_string(),
        other => format!("af({other})"),
    }
}

#[must_use]
pub fn socktype_name(socktype: i32) -> String {
    match socktype {
        0 => "any".to_string(),
        libc::SOCK_STREAM => "stream".to_string(),
        libc::SOCK_DGRAM => "dgram".to_string(),
        libc::SOCK_RAW => "raw".to_string(),
        libc::SOCK_SEQPACKET => "seqpacket".to_string(),
        other => format!("sock({other})"),
    }
}

#[must_use]
pub fn protocol_name(protocol: i32) -> String {
    match protocol {
        0 => "default".to_string(),
        libc::IPPROTO_TCP => "tcp".to_string(),
        libc::IPPROTO_UDP => "udp".to_string(),
        other => format!("proto({other})"),
    }
}

/// One resolved record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddrInfoView {
    pub family: String,
    pub socktype: String,
    pub protocol: String,
    pub flags: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canonname: Option<String>,
    /// Decoded `ip:port`, absent for non-IP families.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub addrlen: usize,
}

impl From<&AddrInfo> for AddrInfoView {
    fn from(info: &AddrInfo) -> Self {
        Self {
            family: family_name(info.family()),
            socktype: socktype_name(info.socktype()),
            protocol: protocol_name(info.protocol()),
            flags: info.flags(),
            canonname: info.canonname().map(str::to_owned),
            address: info.socket_addr().map(|a| a.to_string()),
            addrlen: info.addr().len(),
        }
    }
}

/// A whole resolution.
#[derive(Debug, Clone, Serialize)]
pub struct ResolveReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    pub records: Vec<AddrInfoView>,
}

impl ResolveReport {
    #[must_use]
    pub fn new(host: Option<&str>, service: Option<&str>, records: &[AddrInfo]) -> Self {
        Self {
            host: host.map(str::to_owned),
            service: service.map(str::to_owned),
            records: records.iter().map(AddrInfoView::from).collect(),
        }
    }

    /// One line per record.
    #[must_use]
    pub fn to_plain(&self) -> String {
        let mut out = String::new();
        for record in &self.records {
            let address = record.address.as_deref().unwrap_or("-");
            out.push_str(&format!(
                "{:<6} {:<9} {:<7} {}",
                record.family, record.socktype, record.protocol, address
            ));
            if let Some(name) = &record.canonname {
                out.push_str(&format!(" ({name})"));
            }
            out.push('\n');
        }
        out
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
