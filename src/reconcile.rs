use crate::iprules::IngressRule;
use crate::iprules::IpRange;
use crate::iprules::OwnerTag;
use crate::iprules::TCP;
use std::net::Ipv4Addr;

/// What to do with a rebuilt rule that ends up with no range owned by the
/// caller.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum UnownedPolicy {
    /// Add the caller's range so the caller still gains access.
    Append,
    /// Keep only the copied ranges.
    Leave,
}

impl Default for UnownedPolicy {
    fn default() -> UnownedPolicy {
        UnownedPolicy::Append
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerContext {
    pub owner: OwnerTag,
    pub ip_addr: Ipv4Addr,
    pub ports: Vec<u16>,
    pub group_id: String,
    pub unowned: UnownedPolicy,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciliationPlan {
    pub to_revoke: Vec<IngressRule>,
    /// One rule per requested port, in request order.
    pub to_authorize: Vec<IngressRule>,
}

pub fn reconcile(existing: &[IngressRule], ctx: &CallerContext) -> ReconciliationPlan {
    // only our single-port TCP rules on requested ports are revoked and
    // rewritten
    let candidates: Vec<&IngressRule> = existing
        .iter()
        .filter(|rule| {
            rule.protocol == TCP
                && rule.from_port == rule.to_port
                && rule.ip_ranges.iter().any(|range| ctx.owner.owns(range))
                && ctx.ports.contains(&rule.to_port)
        })
        .collect();

    let to_revoke = candidates.iter().map(|rule| rule.normalized()).collect();

    let to_authorize = ctx
        .ports
        .iter()
        .map(|&port| {
            // every candidate on the port is revoked, so all of their ranges
            // go into the one replacement rule
            let ranges: Vec<&IpRange> = candidates
                .iter()
                .copied()
                .filter(|rule| rule.to_port == port)
                .flat_map(|rule| rule.ip_ranges.iter())
                .collect();
            let ip_ranges = if ranges.is_empty() {
                vec![ctx.owner.claim(ctx.ip_addr)]
            } else {
                rebuild_ranges(ranges, ctx)
            };
            IngressRule::tcp(port, ip_ranges)
        })
        .collect();

    ReconciliationPlan {
        to_revoke,
        to_authorize,
    }
}

// EC2 holds a CIDR at most once per permission, so the first range with a
// given CIDR wins
fn rebuild_ranges<'a, R>(ranges: R, ctx: &CallerContext) -> Vec<IpRange>
where
    R: IntoIterator<Item = &'a IpRange>,
{
    let mut rebuilt: Vec<IpRange> = Vec::new();
    for range in ranges {
        let range = if ctx.owner.owns(range) {
            ctx.owner.claim(ctx.ip_addr)
        } else {
            range.clone()
        };
        if !rebuilt.iter().any(|r| r.cidr == range.cidr) {
            rebuilt.push(range);
        }
    }
    let claim = ctx.owner.claim(ctx.ip_addr);
    if ctx.unowned == UnownedPolicy::Append
        && !rebuilt
            .iter()
            .any(|r| ctx.owner.owns(r) || r.cidr == claim.cidr)
    {
        rebuilt.push(claim);
    }
    rebuilt
}
