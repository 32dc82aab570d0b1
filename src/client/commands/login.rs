//! `anchor login` and `anchor ssh-login`

use anyhow::Result;
use camino::Utf8PathBuf;
use clap::Parser;

use crate::client::remote::{LoginOutcome, RemoteClient};
use crate::client::sshsign;

#[derive(Debug, Parser)]
pub struct Args {
    #[clap(long, default_value = "http://127.0.0.1:8787")]
    server: String,

    username: String,

    /// Prompted for if omitted (not implemented here: passed on the
    /// command line, matching the teacher's non-interactive CLI style).
    password: String,

    /// 2FA code, if the account has 2FA enabled.
    code: Option<String>,
}

pub fn run(args: Args) -> Result<()> {
    let client = RemoteClient::new(&args.server)?;
    match client.login(&args.username, &args.password)? {
        LoginOutcome::LoggedIn => println!("Logged in to {} as {}", args.server, args.username),
        LoginOutcome::TwoFactorRequired { username } => {
            let code = args
                .code
                .ok_or_else(|| anyhow::anyhow!("2FA is enabled for {username}; pass the code as the next argument"))?;
            client.login_2fa(&username, &args.password, &code)?;
            println!("Logged in to {} as {}", args.server, username);
        }
    }
    Ok(())
}

#[derive(Debug, Parser)]
pub struct SshArgs {
    #[clap(long, default_value = "http://127.0.0.1:8787")]
    server: String,

    username: String,

    /// Path to a raw 32-byte Ed25519 seed file.
    key: Utf8PathBuf,
}

pub fn run_ssh(args: SshArgs) -> Result<()> {
    let client = RemoteClient::new(&args.server)?;
    let nonce = client.ssh_challenge(&args.username)?;
    let signature = sshsign::sign_nonce(&args.key, &nonce)?;
    client.ssh_login(&args.username, &signature)?;
    println!("Logged in to {} as {}", args.server, args.username);
    Ok(())
}
