use crate::cli::Command;
use crate::cloud::Cloud;
use crate::cloud::CloudRegion;
use crate::cloud::Firewall;
use crate::errors::ErrorKind;
use crate::iprules::OwnerTag;
use crate::reconcile::reconcile;
use crate::reconcile::CallerContext;
use crate::reconcile::ReconciliationPlan;
use crate::reconcile::UnownedPolicy;
use failure::Error;
use std::net::Ipv4Addr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionReport {
    pub region: String,
    pub group_id: String,
    pub plan: ReconciliationPlan,
}

/// Updates the group in each region in turn. The first error stops the run;
/// regions after it are never contacted.
pub fn dispatch<C>(
    cmd: &Command,
    ip_addr: Ipv4Addr,
    cloud: &C,
) -> Result<Vec<RegionReport>, Error>
where
    C: Cloud,
{
    debug!("Running command: {:?}", cmd);

    let owner = OwnerTag::new(cloud.user_name()?);
    debug!("Tagging ranges as: {}", owner);

    let mut reports = Vec::new();
    for region_name in &cmd.regions {
        let region = cloud.region(region_name)?;
        let fw = find_firewall(&region, &cmd.group)?;
        println!("{} found group {}", region.name(), fw.id());

        let existing_rules = fw.list_ingress_rules()?;
        debug!("Existing rules: {:?}", existing_rules);

        let ctx = CallerContext {
            owner: owner.clone(),
            ip_addr,
            ports: cmd.ports.clone(),
            group_id: fw.id().to_owned(),
            unowned: UnownedPolicy::default(),
        };
        let plan = reconcile(&existing_rules, &ctx);

        // revoke first: EC2 rejects the new rule as a duplicate while a stale
        // one with the same CIDR is still there
        if !plan.to_revoke.is_empty() {
            info!("Removing rules: {:?}", plan.to_revoke);
            fw.revoke_ingress_rules(&plan.to_revoke)?;
        }
        info!("Adding rules: {:?}", plan.to_authorize);
        fw.authorize_ingress_rules(&plan.to_authorize)?;

        println!(
            "{} updated group {} to ip {}/32 and ports {}",
            region.name(),
            ctx.group_id,
            ip_addr,
            join(&cmd.ports)
        );
        reports.push(RegionReport {
            region: region.name().to_owned(),
            group_id: ctx.group_id,
            plan,
        });
    }

    Ok(reports)
}

fn find_firewall<R>(region: &R, group: &str) -> Result<R::Firewall, Error>
where
    R: CloudRegion,
{
    let mut fws = region.find_firewalls(group)?;
    match fws.len() {
        0 => Err(ErrorKind::GroupNotFound {
            group: group.to_owned(),
            region: region.name().to_owned(),
        }
        .into()),
        1 => Ok(fws.remove(0)),
        count => Err(ErrorKind::AmbiguousGroup {
            group: group.to_owned(),
            region: region.name().to_owned(),
            count,
        }
        .into()),
    }
}

fn join(ports: &[u16]) -> String {
    ports
        .iter()
        .map(u16::to_string)
        .collect::<Vec<_>>()
        .join(",")
}
