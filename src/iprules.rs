use ipnet::Ipv4Net;
use std::fmt;
use std::net::Ipv4Addr;

pub const TCP: &str = "tcp";

#[derive(Clone, Hash, PartialEq, Eq)]
pub struct IpRange {
    // kept as text so that ranges we do not own round-trip unchanged
    pub cidr: String,
    pub description: Option<String>,
}

impl IpRange {
    pub fn new<C, D>(cidr: C, description: D) -> IpRange
    where
        C: Into<String>,
        D: Into<String>,
    {
        IpRange {
            cidr: cidr.into(),
            description: Some(description.into()),
        }
    }

    fn normalized(&self) -> IpRange {
        IpRange {
            cidr: self.cidr.clone(),
            description: self.description.clone().filter(|d| !d.is_empty()),
        }
    }
}

impl fmt::Debug for IpRange {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.description {
            Some(ref description) => write!(f, "{} ({})", self.cidr, description),
            None => write!(f, "{}", self.cidr),
        }
    }
}

#[derive(Clone, Hash, PartialEq, Eq)]
pub struct IngressRule {
    pub protocol: String,
    pub from_port: u16,
    pub to_port: u16,
    pub ip_ranges: Vec<IpRange>,
}

impl IngressRule {
    pub fn tcp(port: u16, ip_ranges: Vec<IpRange>) -> IngressRule {
        IngressRule {
            protocol: TCP.to_owned(),
            from_port: port,
            to_port: port,
            ip_ranges,
        }
    }

    /// Strips attributes that are present but empty. EC2 rejects revoke
    /// requests carrying them, so this runs before a rule is sent back.
    pub fn normalized(&self) -> IngressRule {
        IngressRule {
            protocol: self.protocol.clone(),
            from_port: self.from_port,
            to_port: self.to_port,
            ip_ranges: self.ip_ranges.iter().map(IpRange::normalized).collect(),
        }
    }
}

impl fmt::Debug for IngressRule {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.from_port == self.to_port {
            write!(f, "{}/{}", self.to_port, self.protocol)?;
        } else {
            write!(f, "{}-{}/{}", self.from_port, self.to_port, self.protocol)?;
        }
        write!(f, " -> {:?}", self.ip_ranges)
    }
}

/// Marks IP ranges as belonging to the caller by writing their identity into
/// the range description. This is the only place that knows the convention.
#[derive(Clone, Hash, PartialEq, Eq)]
pub struct OwnerTag(String);

impl OwnerTag {
    pub fn new<S: Into<String>>(s: S) -> OwnerTag {
        OwnerTag(s.into())
    }

    pub fn owns(&self, range: &IpRange) -> bool {
        range.description.as_ref() == Some(&self.0)
    }

    pub fn claim(&self, ip_addr: Ipv4Addr) -> IpRange {
        let net = Ipv4Net::new(ip_addr, 32).expect("32 is OK");
        IpRange::new(net.to_string(), self.0.clone())
    }
}

impl fmt::Display for OwnerTag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for OwnerTag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
