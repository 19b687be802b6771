use crate::cloud::Firewall;
use crate::errors::ErrorKind;
use crate::iprules::IngressRule;
use crate::iprules::IpRange;
use failure::Error;
use failure::ResultExt;
use rusoto_ec2::AuthorizeSecurityGroupIngressRequest;
use rusoto_ec2::DescribeSecurityGroupsRequest;
use rusoto_ec2::Ec2;
use rusoto_ec2::Ec2Client;
use rusoto_ec2::Filter;
use rusoto_ec2::IpPermission;
use rusoto_ec2::IpRange as Ec2IpRange;
use rusoto_ec2::RevokeSecurityGroupIngressRequest;
use std::convert::TryFrom;
use std::fmt;
use std::rc::Rc;
use tokio::runtime::Runtime;

pub struct AwsFirewall {
    id: String,
    name: String,
    region: String,
    // as described when the group was found; this is the only read we make
    ip_permissions: Vec<IpPermission>,
    client: Rc<Ec2Client>,
    runtime: Rc<Runtime>,
}

impl AwsFirewall {
    pub(super) fn list(
        client: &Rc<Ec2Client>,
        runtime: &Rc<Runtime>,
        region: &str,
        group_name: &str,
    ) -> Result<Vec<AwsFirewall>, Error> {
        // a filter rather than GroupNames, which only finds groups in the
        // default VPC and fails outright when nothing matches
        let filter = Filter {
            name: Some("group-name".to_owned()),
            values: Some(vec![group_name.to_owned()]),
        };
        let mut values: Vec<AwsFirewall> = Vec::new();
        let mut next_token = None;
        loop {
            let req = DescribeSecurityGroupsRequest {
                filters: Some(vec![filter.clone()]),
                next_token: next_token.take(),
                ..Default::default()
            };
            let resp = runtime
                .block_on(client.describe_security_groups(req))
                .with_context(|_e| {
                    ErrorKind::api_request(format!(
                        "describe security groups named {} in {}",
                        group_name, region
                    ))
                })?;
            for sg in resp.security_groups.unwrap_or_default() {
                let id = sg
                    .group_id
                    .ok_or_else(|| format_err!("expected security group to have an id"))?;
                let value = AwsFirewall {
                    name: sg.group_name.unwrap_or_else(|| group_name.to_owned()),
                    id,
                    region: region.to_owned(),
                    ip_permissions: sg.ip_permissions.unwrap_or_default(),
                    client: Rc::clone(client),
                    runtime: Rc::clone(runtime),
                };
                values.push(value);
            }
            match resp.next_token {
                Some(token) => next_token = Some(token),
                None => break,
            }
        }
        Ok(values)
    }
}

impl fmt::Debug for AwsFirewall {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

impl Firewall for AwsFirewall {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn list_ingress_rules(&self) -> Result<Vec<IngressRule>, Error> {
        let mut rules = Vec::new();
        for ip_permission in &self.ip_permissions {
            match from_ip_permission(ip_permission) {
                Some(rule) => rules.push(rule),
                None => warn!(
                    "{} skipping permission without a TCP/UDP port range: {:?}",
                    self.region, ip_permission
                ),
            }
        }
        Ok(rules)
    }

    fn revoke_ingress_rules(&self, rules: &[IngressRule]) -> Result<(), Error> {
        let ip_permissions: Vec<IpPermission> = rules.iter().map(to_ip_permission).collect();
        if ip_permissions.is_empty() {
            return Ok(());
        }
        let req = RevokeSecurityGroupIngressRequest {
            group_id: Some(self.id.clone()),
            ip_permissions: Some(ip_permissions),
            ..Default::default()
        };
        self.runtime
            .block_on(self.client.revoke_security_group_ingress(req))
            .with_context(|_e| {
                ErrorKind::api_request(format!(
                    "revoke ingress for security group {} in {}",
                    self.id, self.region
                ))
            })?;
        Ok(())
    }

    fn authorize_ingress_rules(&self, rules: &[IngressRule]) -> Result<(), Error> {
        let ip_permissions: Vec<IpPermission> = rules.iter().map(to_ip_permission).collect();
        if ip_permissions.is_empty() {
            return Ok(());
        }
        let req = AuthorizeSecurityGroupIngressRequest {
            group_id: Some(self.id.clone()),
            ip_permissions: Some(ip_permissions),
            ..Default::default()
        };
        self.runtime
            .block_on(self.client.authorize_security_group_ingress(req))
            .with_context(|_e| {
                ErrorKind::api_request(format!(
                    "authorize ingress for security group {} in {}",
                    self.id, self.region
                ))
            })?;
        Ok(())
    }
}

// None for "all traffic" and ICMP permissions, which have no port range
fn from_ip_permission(ip_permission: &IpPermission) -> Option<IngressRule> {
    let from_port = ip_permission.from_port.and_then(|p| u16::try_from(p).ok())?;
    let to_port = ip_permission.to_port.and_then(|p| u16::try_from(p).ok())?;
    let protocol = ip_permission.ip_protocol.clone()?;
    let ip_ranges = ip_permission
        .ip_ranges
        .iter()
        .flatten()
        .filter_map(|range| {
            range.cidr_ip.as_ref().map(|cidr| IpRange {
                cidr: cidr.clone(),
                description: range.description.clone(),
            })
        })
        .collect();
    Some(IngressRule {
        protocol,
        from_port,
        to_port,
        ip_ranges,
    })
}

fn to_ip_permission(rule: &IngressRule) -> IpPermission {
    let ip_ranges = rule
        .ip_ranges
        .iter()
        .map(|range| Ec2IpRange {
            cidr_ip: Some(range.cidr.clone()),
            description: range.description.clone(),
        })
        .collect();
    IpPermission {
        ip_protocol: Some(rule.protocol.clone()),
        from_port: Some(rule.from_port.into()),
        to_port: Some(rule.to_port.into()),
        ip_ranges: non_empty(ip_ranges),
        ..Default::default()
    }
}

// EC2 treats an empty list differently from an absent one, so empty
// collections are never sent
fn non_empty<T>(xs: Vec<T>) -> Option<Vec<T>> {
    if xs.is_empty() {
        None
    } else {
        Some(xs)
    }
}
