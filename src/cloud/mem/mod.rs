
pub use crate::cloud::mem::firewall::MemFirewall;
use crate::cloud::Cloud;
use crate::cloud::CloudRegion;
use crate::cloud::Firewall;
use crate::errors::ErrorKind;
use failure::Error;
use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::ops::Range;
use std::rc::Rc;

pub struct MemCloud {
    state: Rc<RefCell<MemCloudState>>,
    calls: CallLog,
}

struct MemCloudState {
    ids: Range<u32>,
    user_name: Option<String>,
    firewalls: Vec<MemFirewall>,
    unavailable_regions: HashSet<String>,
}

/// Every request that reached the fake API, in order, e.g.
/// `"eu-west-1 authorize sg-0"`.
pub type CallLog = Rc<RefCell<Vec<String>>>;

impl MemCloud {
    pub fn new(user_name: Option<&str>) -> Result<MemCloud, Error> {
        Ok(MemCloud {
            state: Rc::new(RefCell::new(MemCloudState {
                ids: 0..u32::MAX,
                user_name: user_name.map(str::to_owned),
                firewalls: Vec::new(),
                unavailable_regions: HashSet::new(),
            })),
            calls: Rc::new(RefCell::new(Vec::new())),
        })
    }

    pub fn create_firewall(&self, region: &str, name: &str) -> Result<MemFirewall, Error> {
        let mut state = self.state.borrow_mut();
        let id = format!("sg-{}", state.fresh_id()?);
        let value = MemFirewall::new(id, name.to_owned(), region.to_owned(), &self.calls)?;
        state.firewalls.push(value.clone());
        Ok(value)
    }

    /// Makes every describe request in the region fail.
    pub fn make_unavailable(&self, region: &str) {
        let mut state = self.state.borrow_mut();
        state.unavailable_regions.insert(region.to_owned());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl MemCloudState {
    fn fresh_id(&mut self) -> Result<String, Error> {
        self.ids
            .next()
            .map(|id| id.to_string())
            .ok_or_else(|| format_err!("exhausted"))
    }
}

impl Cloud for MemCloud {
    type Region = MemRegion;

    fn user_name(&self) -> Result<String, Error> {
        let state = self.state.borrow();
        match state.user_name {
            Some(ref user_name) => Ok(user_name.clone()),
            None => Err(ErrorKind::IdentityResolution.into()),
        }
    }

    fn region(&self, name: &str) -> Result<MemRegion, Error> {
        Ok(MemRegion {
            name: name.to_owned(),
            state: Rc::clone(&self.state),
            calls: Rc::clone(&self.calls),
        })
    }
}

pub struct MemRegion {
    name: String,
    state: Rc<RefCell<MemCloudState>>,
    calls: CallLog,
}

impl fmt::Debug for MemRegion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl CloudRegion for MemRegion {
    type Firewall = MemFirewall;

    fn name(&self) -> &str {
        &self.name
    }

    fn find_firewalls(&self, group_name: &str) -> Result<Vec<MemFirewall>, Error> {
        self.calls
            .borrow_mut()
            .push(format!("{} describe {}", self.name, group_name));
        let state = self.state.borrow();
        if state.unavailable_regions.contains(&self.name) {
            return Err(ErrorKind::api_request(format!(
                "describe security groups named {} in {}",
                group_name, self.name
            ))
            .into());
        }
        let xs = state
            .firewalls
            .iter()
            .filter(|x| x.region() == self.name && x.name() == group_name)
            .cloned()
            .collect();
        Ok(xs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors;
    use crate::iprules::IngressRule;
    use crate::iprules::IpRange;

    fn rule(port: u16, ranges: &[(&str, &str)]) -> IngressRule {
        IngressRule::tcp(
            port,
            ranges
                .iter()
                .map(|&(cidr, desc)| IpRange::new(cidr, desc))
                .collect(),
        )
    }

    #[test]
    fn test_find_firewalls_by_region_and_name() {
        test_find_firewalls_by_region_and_name_impl().unwrap();
    }

    fn test_find_firewalls_by_region_and_name_impl() -> Result<(), Error> {
        let cloud = MemCloud::new(Some("alice"))?;
        let fw = cloud.create_firewall("us-east-1", "ssh")?;
        cloud.create_firewall("us-east-1", "web")?;
        cloud.create_firewall("eu-west-1", "ssh")?;

        let found = cloud.region("us-east-1")?.find_firewalls("ssh")?;
        assert_eq!(1, found.len());
        assert_eq!(fw.id(), found[0].id());

        assert!(cloud.region("ap-south-1")?.find_firewalls("ssh")?.is_empty());
        assert_eq!(
            vec!["us-east-1 describe ssh", "ap-south-1 describe ssh"],
            cloud.calls()
        );
        Ok(())
    }

    #[test]
    fn test_authorize_merges_into_existing_permission() {
        test_authorize_merges_into_existing_permission_impl().unwrap();
    }

    fn test_authorize_merges_into_existing_permission_impl() -> Result<(), Error> {
        let cloud = MemCloud::new(Some("alice"))?;
        let fw = cloud.create_firewall("us-east-1", "ssh")?;
        fw.authorize_ingress_rules(&[rule(22, &[("10.0.0.0/8", "bob")])])?;
        fw.authorize_ingress_rules(&[
            rule(22, &[("1.2.3.4/32", "alice")]),
            rule(443, &[("1.2.3.4/32", "alice")]),
        ])?;
        assert_eq!(
            vec![
                rule(22, &[("10.0.0.0/8", "bob"), ("1.2.3.4/32", "alice")]),
                rule(443, &[("1.2.3.4/32", "alice")]),
            ],
            fw.list_ingress_rules()?
        );
        Ok(())
    }

    #[test]
    fn test_authorize_rejects_duplicate_range() {
        test_authorize_rejects_duplicate_range_impl().unwrap();
    }

    fn test_authorize_rejects_duplicate_range_impl() -> Result<(), Error> {
        let cloud = MemCloud::new(Some("alice"))?;
        let fw = cloud.create_firewall("us-east-1", "ssh")?;
        fw.authorize_ingress_rules(&[rule(22, &[("1.2.3.4/32", "alice")])])?;

        let err = fw
            .authorize_ingress_rules(&[
                rule(443, &[("1.2.3.4/32", "alice")]),
                rule(22, &[("1.2.3.4/32", "someone else")]),
            ])
            .unwrap_err();
        assert_eq!(
            Some(&ErrorKind::api_request(format!(
                "authorize ingress for security group {} in us-east-1",
                fw.id()
            ))),
            errors::kind(&err)
        );
        // nothing from a rejected request is applied
        assert_eq!(
            vec![rule(22, &[("1.2.3.4/32", "alice")])],
            fw.list_ingress_rules()?
        );
        Ok(())
    }

    #[test]
    fn test_revoke_removes_ranges_and_empty_permissions() {
        test_revoke_removes_ranges_and_empty_permissions_impl().unwrap();
    }

    fn test_revoke_removes_ranges_and_empty_permissions_impl() -> Result<(), Error> {
        let cloud = MemCloud::new(Some("alice"))?;
        let fw = cloud.create_firewall("us-east-1", "ssh")?;
        fw.authorize_ingress_rules(&[
            rule(22, &[("10.0.0.0/8", "bob"), ("1.2.3.4/32", "alice")]),
            rule(443, &[("1.2.3.4/32", "alice")]),
        ])?;
        fw.revoke_ingress_rules(&[
            rule(22, &[("1.2.3.4/32", "alice")]),
            rule(443, &[("1.2.3.4/32", "alice")]),
        ])?;
        assert_eq!(
            vec![rule(22, &[("10.0.0.0/8", "bob")])],
            fw.list_ingress_rules()?
        );
        Ok(())
    }

    #[test]
    fn test_revoke_rejects_unknown_range() {
        test_revoke_rejects_unknown_range_impl().unwrap();
    }

    fn test_revoke_rejects_unknown_range_impl() -> Result<(), Error> {
        let cloud = MemCloud::new(Some("alice"))?;
        let fw = cloud.create_firewall("us-east-1", "ssh")?;
        fw.authorize_ingress_rules(&[rule(22, &[("1.2.3.4/32", "alice")])])?;
        let err = fw
            .revoke_ingress_rules(&[
                rule(22, &[("1.2.3.4/32", "alice")]),
                rule(22, &[("5.6.7.8/32", "alice")]),
            ])
            .unwrap_err();
        assert!(errors::kind(&err).is_some());
        assert_eq!(
            vec![rule(22, &[("1.2.3.4/32", "alice")])],
            fw.list_ingress_rules()?
        );
        Ok(())
    }

    #[test]
    fn test_unavailable_region() {
        test_unavailable_region_impl().unwrap();
    }

    fn test_unavailable_region_impl() -> Result<(), Error> {
        let cloud = MemCloud::new(None)?;
        cloud.create_firewall("us-east-1", "ssh")?;
        cloud.make_unavailable("us-east-1");
        assert!(cloud.region("us-east-1")?.find_firewalls("ssh").is_err());
        assert_eq!(
            Some(&ErrorKind::IdentityResolution),
            errors::kind(&cloud.user_name().unwrap_err())
        );
        Ok(())
    }
}
