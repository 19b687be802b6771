use crate::checkip;
use crate::cli::Command;
use clap::App;
use clap::AppSettings;
use clap::Arg;
use failure::Error;
use failure::ResultExt;
use std::ffi::OsString;

fn define_app<'a, 'b>() -> App<'a, 'b> {
    App::new(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .author(env!("CARGO_PKG_AUTHORS"))
        .about(
            "Grants your current public IP address access to a security group, \
             replacing the access previously granted to you",
        )
        .setting(AppSettings::DeriveDisplayOrder)
        .arg(
            Arg::with_name("group")
                .help("Name of the security group to update")
                .short("g")
                .long("group")
                .takes_value(true)
                .required(true),
        )
        .arg(
            Arg::with_name("regions")
                .help("Regions to update the security group in, one after the other")
                .short("r")
                .long("regions")
                .takes_value(true)
                .multiple(true)
                .default_value("us-east-1"),
        )
        .arg(
            Arg::with_name("ports")
                .help("TCP ports to allow through the security group")
                .short("P")
                .long("ports")
                .takes_value(true)
                .multiple(true)
                .default_value("22"),
        )
        .arg(
            Arg::with_name("url")
                .help("Service that answers with your public IPv4 address as plain text")
                .short("u")
                .long("url")
                .takes_value(true)
                .default_value(checkip::DEFAULT_URL),
        )
        .arg(
            Arg::with_name("profile")
                .help("Profile to load from the shared AWS credentials file")
                .short("p")
                .long("profile")
                .takes_value(true),
        )
}

pub fn parse_from_safe<I, T>(args: I) -> Result<Command, Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let app = define_app();
    let matches = app.get_matches_from_safe(args)?;

    let group = matches.value_of("group").expect("required").to_owned();

    let regions = matches
        .values_of("regions")
        .expect("defaulted")
        .map(str::to_owned)
        .collect();

    let ports = matches
        .values_of("ports")
        .expect("defaulted")
        .map(|x| {
            x.parse::<u16>()
                .with_context(|_e| format!("not a port: {}", x))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let url = matches.value_of("url").expect("defaulted").to_owned();

    let profile = matches.value_of("profile").map(str::to_owned);

    Ok(Command {
        group,
        regions,
        ports,
        url,
        profile,
    })
}
