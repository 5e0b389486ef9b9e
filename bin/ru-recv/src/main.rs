#![deny(unsafe_code)]

use std::{env, process::ExitCode};

use clap::Parser;
use cli::ReceiverArgs;

fn main() -> ExitCode {
    run_with(env::args_os())
}

fn run_with<I>(args: I) -> ExitCode
where
    I: IntoIterator,
    I::Item: Into<std::ffi::OsString> + Clone,
{
    let args = match ReceiverArgs::try_parse_from(args) {
        Ok(args) => args,
        Err(err) => {
            err.print().ok();
            return ExitCode::from(1);
        }
    };
    cli::run_receiver(args)
}
