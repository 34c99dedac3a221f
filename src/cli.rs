use std::{ffi::OsString, path::PathBuf};

use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use scout_domain::ChainName;
use scout_resolver::QueryType;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Cli {
    pub config: Option<PathBuf>,
    pub command: CliCommand,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CliCommand {
    Resolve(ResolveArgs),
    Delivery(DeliveryArgs),
    Chains,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ResolveArgs {
    pub identifier: String,
    pub chains: Vec<ChainName>,
    pub query_type: Option<QueryType>,
    pub from_block: Option<u64>,
    pub to_block: Option<u64>,
    pub check_delivery: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DeliveryArgs {
    pub message_id: String,
    pub chain: ChainName,
    pub from_block: Option<u64>,
    pub to_block: Option<u64>,
}

fn block_args() -> [Arg; 2] {
    [
        Arg::new("from-block")
            .long("from-block")
            .value_name("BLOCK")
            .value_parser(value_parser!(u64))
            .help(
                "First block of the log search window (default: head minus the configured window)",
            ),
        Arg::new("to-block")
            .long("to-block")
            .value_name("BLOCK")
            .value_parser(value_parser!(u64))
            .help("Last block of the log search window (default: chain head)"),
    ]
}

fn parse_query_type(value: &str) -> Result<QueryType, String> {
    value.parse()
}

pub(crate) fn command() -> Command {
    Command::new("mailbox-scout")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Finds interchain mailbox messages on chains without an indexer")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Sets a custom config file (.toml format)"),
        )
        .subcommand_required(true)
        .subcommand(
            Command::new("resolve")
                .about("Resolve a transaction hash, message id or address into dispatched messages")
                .arg(
                    Arg::new("identifier")
                        .required(true)
                        .value_name("ID")
                        .help("0x-prefixed transaction hash, message id or address"),
                )
                .arg(
                    Arg::new("chain")
                        .long("chain")
                        .value_name("NAME")
                        .action(ArgAction::Append)
                        .help(
                            "Chain to search; repeat for several (default: every configured chain)",
                        ),
                )
                .arg(
                    Arg::new("type")
                        .long("type")
                        .value_name("TYPE")
                        .value_parser(parse_query_type)
                        .help("Interpretation of ID: tx-hash, message-id or address"),
                )
                .args(block_args())
                .arg(
                    Arg::new("check-delivery")
                        .long("check-delivery")
                        .action(ArgAction::SetTrue)
                        .help("Also look up each message's delivery on its destination chain"),
                ),
        )
        .subcommand(
            Command::new("delivery")
                .about("Check whether a message was processed on its destination chain")
                .arg(
                    Arg::new("message-id")
                        .required(true)
                        .value_name("MESSAGE_ID")
                        .help("0x-prefixed 32-byte message id"),
                )
                .arg(
                    Arg::new("chain")
                        .long("chain")
                        .required(true)
                        .value_name("NAME")
                        .help("Destination chain"),
                )
                .args(block_args()),
        )
        .subcommand(Command::new("chains").about("List configured chains and their sources"))
}

pub(crate) fn parse() -> Cli {
    from_matches(&command().get_matches())
}

pub(crate) fn try_parse_from<I, T>(args: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    command().try_get_matches_from(args).map(|m| from_matches(&m))
}

fn from_matches(matches: &ArgMatches) -> Cli {
    let config = matches.get_one::<PathBuf>("config").cloned();
    let command = match matches.subcommand() {
        Some(("resolve", sub)) => CliCommand::Resolve(ResolveArgs {
            identifier: string_arg(sub, "identifier"),
            chains: sub
                .get_many::<String>("chain")
                .map(|names| names.map(ChainName::new).collect())
                .unwrap_or_default(),
            query_type: sub.get_one::<QueryType>("type").copied(),
            from_block: sub.get_one::<u64>("from-block").copied(),
            to_block: sub.get_one::<u64>("to-block").copied(),
            check_delivery: sub.get_flag("check-delivery"),
        }),
        Some(("delivery", sub)) => CliCommand::Delivery(DeliveryArgs {
            message_id: string_arg(sub, "message-id"),
            chain: ChainName::new(string_arg(sub, "chain")),
            from_block: sub.get_one::<u64>("from-block").copied(),
            to_block: sub.get_one::<u64>("to-block").copied(),
        }),
        // `subcommand_required` leaves `chains` as the only remaining case.
        _ => CliCommand::Chains,
    };
    Cli { config, command }
}

fn string_arg(matches: &ArgMatches, id: &str) -> String {
    matches.get_one::<String>(id).cloned().unwrap_or_default()
}
