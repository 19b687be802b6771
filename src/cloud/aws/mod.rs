use crate::cloud::aws::firewall::AwsFirewall;
use crate::cloud::Cloud;
use crate::cloud::CloudRegion;
use crate::errors::ErrorKind;
use failure::Error;
use failure::ResultExt;
use rusoto_core::HttpClient;
use rusoto_core::Region;
use rusoto_credential::DefaultCredentialsProvider;
use rusoto_credential::ProfileProvider;
use rusoto_ec2::Ec2Client;
use rusoto_iam::GetUserRequest;
use rusoto_iam::Iam;
use rusoto_iam::IamClient;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;
use tokio::runtime::Builder;
use tokio::runtime::Runtime;

mod firewall;

pub struct AwsCloud {
    credentials: Credentials,
    runtime: Rc<Runtime>,
}

#[derive(Clone)]
enum Credentials {
    Default,
    Profile(ProfileProvider),
}

impl AwsCloud {
    pub fn new(profile: Option<&str>) -> Result<AwsCloud, Error> {
        let credentials = match profile {
            Some(profile) => {
                let mut provider =
                    ProfileProvider::new().context("could not create profile provider")?;
                provider.set_profile(profile);
                Credentials::Profile(provider)
            }
            None => Credentials::Default,
        };
        // rusoto is async; every request is driven to completion here, one
        // at a time
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .context("could not create runtime")?;
        Ok(AwsCloud {
            credentials,
            runtime: Rc::new(runtime),
        })
    }

    fn ec2_client(&self, region: Region) -> Result<Ec2Client, Error> {
        let tls_client = HttpClient::new().context("could not create TLS client")?;
        let ec2 = match self.credentials {
            Credentials::Default => {
                let provider = DefaultCredentialsProvider::new()
                    .context("could not create credentials provider")?;
                Ec2Client::new_with(tls_client, provider, region)
            }
            Credentials::Profile(ref provider) => {
                Ec2Client::new_with(tls_client, provider.clone(), region)
            }
        };
        Ok(ec2)
    }

    fn iam_client(&self) -> Result<IamClient, Error> {
        let tls_client = HttpClient::new().context("could not create TLS client")?;
        // IAM is a global service homed in us-east-1
        let region = Region::UsEast1;
        let iam = match self.credentials {
            Credentials::Default => {
                let provider = DefaultCredentialsProvider::new()
                    .context("could not create credentials provider")?;
                IamClient::new_with(tls_client, provider, region)
            }
            Credentials::Profile(ref provider) => {
                IamClient::new_with(tls_client, provider.clone(), region)
            }
        };
        Ok(iam)
    }
}

impl Cloud for AwsCloud {
    type Region = AwsRegion;

    fn user_name(&self) -> Result<String, Error> {
        let iam = self.iam_client().context(ErrorKind::IdentityResolution)?;
        let resp = self
            .runtime
            .block_on(iam.get_user(GetUserRequest { user_name: None }))
            .context(ErrorKind::IdentityResolution)?;
        Ok(resp.user.user_name)
    }

    fn region(&self, name: &str) -> Result<AwsRegion, Error> {
        let region =
            Region::from_str(name).with_context(|_e| format!("not an AWS region: {}", name))?;
        let client = self.ec2_client(region)?;
        Ok(AwsRegion {
            name: name.to_owned(),
            client: Rc::new(client),
            runtime: Rc::clone(&self.runtime),
        })
    }
}

pub struct AwsRegion {
    name: String,
    client: Rc<Ec2Client>,
    runtime: Rc<Runtime>,
}

impl fmt::Debug for AwsRegion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl CloudRegion for AwsRegion {
    type Firewall = AwsFirewall;

    fn name(&self) -> &str {
        &self.name
    }

    fn find_firewalls(&self, group_name: &str) -> Result<Vec<AwsFirewall>, Error> {
        AwsFirewall::list(&self.client, &self.runtime, &self.name, group_name)
    }
}
