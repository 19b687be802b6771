use crate::errors::ErrorKind;
use failure::Error;
use failure::ResultExt;
use hyper::body;
use hyper::Body;
use hyper::Client;
use hyper::StatusCode;
use hyper::Uri;
use hyper_tls::HttpsConnector;
use std::net::Ipv4Addr;
use std::str;
use std::str::FromStr;
use tokio::runtime::Builder;

pub const DEFAULT_URL: &str = "http://checkip.amazonaws.com/";

/// Asks a "what is my IP" service for our public IPv4 address. The service
/// must answer with the bare address as plain text.
pub fn find_own_ip_addr(url: &str) -> Result<Ipv4Addr, Error> {
    let uri = Uri::from_str(url)
        .with_context(|_e| format!("not a URL: {}", url))
        .context(ErrorKind::IpResolution)?;
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to create runtime")
        .context(ErrorKind::IpResolution)?;
    let (status, content) = runtime
        .block_on(async {
            let client = Client::builder().build::<_, Body>(HttpsConnector::new());
            let res = client.get(uri).await?;
            let status = res.status();
            let content = body::to_bytes(res.into_body()).await?;
            Ok::<_, hyper::Error>((status, content))
        })
        .with_context(|_e| format!("failed to contact checkip service: {}", url))
        .context(ErrorKind::IpResolution)?;
    let ip_addr = parse_response(status, &content).context(ErrorKind::IpResolution)?;
    Ok(ip_addr)
}

fn parse_response(status: StatusCode, content: &[u8]) -> Result<Ipv4Addr, Error> {
    let content = str::from_utf8(content).context("expected checkip to return UTF8")?;
    if !status.is_success() {
        bail!("checkip service returned {}: {}", status, content);
    }
    let ip_addr = Ipv4Addr::from_str(content.trim())
        .with_context(|_e| format!("expected checkip to return IP address: {}", content))?;
    Ok(ip_addr)
}
