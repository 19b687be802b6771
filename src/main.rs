extern crate clap;
extern crate env_logger;
#[macro_use]
extern crate failure;
extern crate hyper;
extern crate hyper_tls;
extern crate ipnet;
#[macro_use]
extern crate log;
extern crate openssl_probe;
extern crate rusoto_core;
extern crate rusoto_credential;
extern crate rusoto_ec2;
extern crate rusoto_iam;
extern crate tokio;

mod checkip;
mod cli;
mod cloud;
mod errors;
mod iprules;
mod reconcile;

use crate::cloud::aws::AwsCloud;
use failure::Error;
use std::env;
use std::process;

fn main() {
    env_logger::init();
    openssl_probe::init_ssl_cert_env_vars();

    let res = run();
    if let Err(ref err) = res {
        debug!("Failed with: {:?}", errors::kind(err));
        for line in error_lines(err) {
            println!("{}", line);
        }
    }
    process::exit(exit_code(&res));
}

fn run() -> Result<(), Error> {
    let cmd = match cli::parse_from_safe(env::args_os()) {
        Ok(cmd) => cmd,
        // usage errors, --help and --version are reported by clap itself
        Err(err) => match err.downcast::<clap::Error>() {
            Ok(err) => err.exit(),
            Err(err) => return Err(err),
        },
    };

    let ip_addr = checkip::find_own_ip_addr(&cmd.url)?;
    println!("using ip {}", ip_addr);

    let cloud = AwsCloud::new(cmd.profile.as_deref())?;
    let reports = cli::dispatch(&cmd, ip_addr, &cloud)?;
    for report in &reports {
        info!(
            "{}: revoked {} rule(s), authorized {} rule(s) in {}",
            report.region,
            report.plan.to_revoke.len(),
            report.plan.to_authorize.len(),
            report.group_id
        );
    }

    println!("done");
    Ok(())
}

/// The error followed by each of its causes, as printed on failure.
fn error_lines(err: &Error) -> Vec<String> {
    let mut lines = vec![format!("error: {}", err)];
    lines.extend(err.iter_causes().map(|cause| format!("caused by: {}", cause)));
    lines
}

fn exit_code<T>(res: &Result<T, Error>) -> i32 {
    match *res {
        Ok(_) => 0,
        Err(_) => 1,
    }
}
