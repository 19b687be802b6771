use failure::Context;
use failure::Fail;
use failure::Error;

#[derive(Fail, Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    #[fail(display = "could not determine caller identity")]
    IdentityResolution,
    #[fail(display = "could not determine public IP address")]
    IpResolution,
    #[fail(display = "no security group named {} in {}", group, region)]
    GroupNotFound { group: String, region: String },
    #[fail(
        display = "should only be 1 security group named {} in {} but was {}",
        group, region, count
    )]
    AmbiguousGroup {
        group: String,
        region: String,
        count: usize,
    },
    #[fail(display = "request rejected: {}", operation)]
    ApiRequest { operation: String },
}

impl ErrorKind {
    pub fn api_request<S: Into<String>>(operation: S) -> ErrorKind {
        ErrorKind::ApiRequest {
            operation: operation.into(),
        }
    }
}

/// Finds the `ErrorKind` anywhere in the cause chain, whether it was raised
/// directly or attached with `ResultExt::context`.
pub fn kind(err: &Error) -> Option<&ErrorKind> {
    err.iter_chain()
        .filter_map(|cause| {
            cause.downcast_ref::<ErrorKind>().or_else(|| {
                cause
                    .downcast_ref::<Context<ErrorKind>>()
                    .map(Context::get_context)
            })
        })
        .next()
}
