//! Interactive menu that drives the ledger server over a TCP session.

use std::io;

use dotenvy::dotenv;
use log::warn;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use pow_ledger::config::Config;
use pow_ledger::dispatch::Request;
use pow_ledger::session::SessionClient;

const MENU: &str = "\
0. View basic blockchain status.
1. Add a transaction to the blockchain.
2. Verify the blockchain.
3. View the blockchain.
4. Corrupt the chain.
5. Hide the corruption by repairing the chain.
6. Exit.";

type Input = Lines<BufReader<Stdin>>;

#[tokio::main(flavor = "current_thread")]
async fn main() -> io::Result<()> {
    let _ = dotenv();
    env_logger::init();
    let config = Config::from_env();

    println!("The client is running.");
    let mut client = SessionClient::connect(config.server_addr.as_str()).await?;
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    loop {
        println!("{MENU}");
        let Some(choice) = input.next_line().await? else {
            // stdin closed: leave politely
            client.send(&Request::Disconnect).await?;
            return Ok(());
        };

        let request = match read_request(choice.trim(), &mut input).await? {
            Some(request) => request,
            None => {
                println!("Invalid Option");
                continue;
            }
        };

        match client.send(&request).await? {
            Some(response) => {
                println!("Got server response");
                println!("{}", response.message());
            }
            None => return Ok(()),
        }
    }
}

/// Prompt for whatever arguments `choice` needs and build the request.
/// Returns `None` for an unknown choice or unparseable number.
async fn read_request(choice: &str, input: &mut Input) -> io::Result<Option<Request>> {
    let request = match choice {
        "0" => Request::Status,
        "1" => {
            let Some(difficulty) = prompt_number(input, "Enter difficulty > 0").await? else {
                return Ok(None);
            };
            let payload = prompt(input, "Enter transaction").await?;
            Request::Append {
                difficulty,
                payload,
            }
        }
        "2" => Request::Validate,
        "3" => Request::Dump,
        "4" => {
            println!("corrupt the Blockchain");
            let Some(index) = prompt_number(input, "Enter block ID of block to corrupt").await?
            else {
                return Ok(None);
            };
            let payload = prompt(input, &format!("Enter new data for block {index}")).await?;
            Request::Corrupt { index, payload }
        }
        "5" => Request::Repair,
        "6" => Request::Disconnect,
        _ => return Ok(None),
    };
    Ok(Some(request))
}

async fn prompt(input: &mut Input, question: &str) -> io::Result<String> {
    println!("{question}");
    match input.next_line().await? {
        Some(line) => Ok(line),
        None => Err(io::Error::new(io::ErrorKind::UnexpectedEof, "stdin closed")),
    }
}

async fn prompt_number<T: std::str::FromStr>(input: &mut Input, question: &str) -> io::Result<Option<T>> {
    let raw = prompt(input, question).await?;
    match raw.trim().parse() {
        Ok(value) => Ok(Some(value)),
        Err(_) => {
            warn!("not a number: {raw:?}");
            Ok(None)
        }
    }
}
