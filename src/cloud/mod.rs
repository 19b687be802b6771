pub mod aws;
#[cfg(test)]
pub mod mem;

use crate::iprules::IngressRule;
use failure::Error;
use std::fmt;

pub trait Cloud {
    type Region: CloudRegion;

    /// The IAM user name of the caller, used to tag the ranges we create.
    fn user_name(&self) -> Result<String, Error>;
    fn region(&self, name: &str) -> Result<Self::Region, Error>;
}

pub trait CloudRegion: fmt::Debug {
    type Firewall: Firewall;

    fn name(&self) -> &str;
    fn find_firewalls(&self, group_name: &str) -> Result<Vec<Self::Firewall>, Error>;
}

pub trait Firewall: fmt::Debug {
    fn id(&self) -> &str;
    fn name(&self) -> &str;
    fn list_ingress_rules(&self) -> Result<Vec<IngressRule>, Error>;
    fn revoke_ingress_rules(&self, rules: &[IngressRule]) -> Result<(), Error>;
    fn authorize_ingress_rules(&self, rules: &[IngressRule]) -> Result<(), Error>;
}
