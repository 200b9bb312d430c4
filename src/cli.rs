// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, value_parser};

pub const USER_ENV: &str = "PENNYLEDGER_USER";

fn json_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print as pretty JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .conflicts_with("json")
            .help("Print as JSON lines"),
    )
}

fn range_args(cmd: Command) -> Command {
    cmd.arg(Arg::new("from").long("from").help("Start date YYYY-MM-DD (inclusive)"))
        .arg(Arg::new("to").long("to").help("End date YYYY-MM-DD (inclusive)"))
}

fn currency_arg() -> Arg {
    Arg::new("currency")
        .long("currency")
        .help("ISO code (USD, EUR, GBP, HUF); defaults to your default currency")
}

fn rate_arg() -> Arg {
    Arg::new("rate")
        .long("rate")
        .help("Exchange-rate snapshot into your default currency")
}

fn date_arg() -> Arg {
    Arg::new("date")
        .long("date")
        .help("YYYY-MM-DD, defaults to today")
}

fn id_arg() -> Arg {
    Arg::new("id")
        .required(true)
        .value_parser(value_parser!(i64))
}

fn transaction_fields(cmd: Command, required: bool) -> Command {
    cmd.arg(Arg::new("title").long("title").required(required))
        .arg(Arg::new("amount").long("amount").required(required))
        .arg(Arg::new("type").long("type").required(required).help("income | expense"))
        .arg(Arg::new("category").long("category").required(required))
        .arg(Arg::new("description").long("description"))
        .arg(currency_arg())
        .arg(rate_arg())
}

fn investment_fields(cmd: Command, required: bool) -> Command {
    cmd.arg(Arg::new("symbol").long("symbol").required(required))
        .arg(Arg::new("name").long("name").required(required))
        .arg(
            Arg::new("type")
                .long("type")
                .required(required)
                .help("stock | bond | crypto | etf | mutual_fund | real_estate | commodity | p2p_lending | other"),
        )
        .arg(Arg::new("quantity").long("quantity").required(required))
        .arg(Arg::new("purchase_price").long("purchase-price").required(required))
        .arg(Arg::new("current_price").long("current-price"))
        .arg(currency_arg())
        .arg(rate_arg())
}

fn bill_fields(cmd: Command, required: bool) -> Command {
    let night = Arg::new("night_reading").long("night-reading");
    cmd.arg(Arg::new("bill_date").long("bill-date").required(required))
        .arg(Arg::new("reading_date").long("reading-date").help("Defaults to the bill date"))
        .arg(Arg::new("day_reading").long("day-reading").required(required))
        .arg(if required { night.default_value("0") } else { night })
        .arg(
            Arg::new("prev_day")
                .long("prev-day")
                .help("Previous day reading; defaults to the latest bill's reading"),
        )
        .arg(Arg::new("prev_night").long("prev-night"))
        .arg(Arg::new("amount").long("amount").required(required))
        .arg(Arg::new("day_rate").long("day-rate"))
        .arg(Arg::new("night_rate").long("night-rate"))
        .arg(Arg::new("standing_charge").long("standing-charge"))
        .arg(Arg::new("notes").long("notes"))
        .arg(currency_arg())
        .arg(rate_arg())
}

fn property_fields(cmd: Command) -> Command {
    cmd.arg(Arg::new("street").long("street").required(true))
        .arg(Arg::new("city").long("city").required(true))
        .arg(Arg::new("country").long("country").required(true))
        .arg(Arg::new("postal_code").long("postal-code"))
        .arg(Arg::new("nickname").long("nickname"))
        .arg(Arg::new("move_in").long("move-in").required(true))
        .arg(Arg::new("move_out").long("move-out"))
        .arg(
            Arg::new("current")
                .long("current")
                .action(ArgAction::SetTrue)
                .help("Mark as the current address"),
        )
        .arg(
            Arg::new("day_night")
                .long("day-night-meter")
                .action(ArgAction::SetTrue),
        )
}

fn schedule_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("frequency")
            .long("frequency")
            .required(true)
            .help("daily | weekly | monthly | yearly"),
    )
    .arg(Arg::new("start").long("start").required(true))
    .arg(Arg::new("end").long("end"))
}

fn recurring_kind_flag() -> Arg {
    Arg::new("investment")
        .long("investment")
        .action(ArgAction::SetTrue)
        .help("Target a recurring investment instead of a recurring transaction")
}

pub fn build_cli() -> Command {
    Command::new("pennyledger")
        .version(clap::crate_version!())
        .about("Multi-currency personal finance tracker")
        .arg(
            Arg::new("user")
                .long("user")
                .global(true)
                .env(USER_ENV)
                .default_value("local")
                .help("User whose records are read and written"),
        )
        .subcommand(Command::new("init").about("Create the database"))
        .subcommand(
            Command::new("prefs")
                .about("User preferences")
                .subcommand(Command::new("show"))
                .subcommand(
                    Command::new("set")
                        .arg(Arg::new("currency").long("currency"))
                        .arg(
                            Arg::new("date_format")
                                .long("date-format")
                                .help("MM/dd/yyyy | dd/MM/yyyy | yyyy-MM-dd"),
                        ),
                ),
        )
        .subcommand(
            Command::new("tx")
                .about("Income and expense transactions")
                .subcommand(transaction_fields(Command::new("add").arg(date_arg()), true))
                .subcommand(json_flags(range_args(
                    Command::new("list")
                        .arg(Arg::new("type").long("type"))
                        .arg(Arg::new("category").long("category"))
                        .arg(
                            Arg::new("limit")
                                .long("limit")
                                .value_parser(value_parser!(usize)),
                        ),
                )))
                .subcommand(transaction_fields(
                    Command::new("edit").arg(id_arg()).arg(date_arg()),
                    false,
                ))
                .subcommand(Command::new("rm").arg(id_arg())),
        )
        .subcommand(
            Command::new("invest")
                .about("Investment holdings")
                .subcommand(investment_fields(Command::new("add").arg(date_arg()), true))
                .subcommand(json_flags(range_args(Command::new("list"))))
                .subcommand(investment_fields(
                    Command::new("edit").arg(id_arg()).arg(date_arg()),
                    false,
                ))
                .subcommand(
                    Command::new("price")
                        .about("Set the current price of a symbol")
                        .arg(Arg::new("symbol").required(true))
                        .arg(Arg::new("price").required(true)),
                )
                .subcommand(Command::new("rm").arg(id_arg())),
        )
        .subcommand(
            Command::new("bill")
                .about("Electricity meter readings and bills")
                .subcommand(bill_fields(Command::new("add"), true))
                .subcommand(json_flags(range_args(Command::new("list"))))
                .subcommand(bill_fields(Command::new("edit").arg(id_arg()), false))
                .subcommand(json_flags(
                    Command::new("history").arg(
                        Arg::new("months")
                            .long("months")
                            .value_parser(value_parser!(u32))
                            .default_value("12"),
                    ),
                ))
                .subcommand(Command::new("rm").arg(id_arg())),
        )
        .subcommand(
            Command::new("property")
                .about("Property addresses")
                .subcommand(property_fields(Command::new("add")))
                .subcommand(json_flags(Command::new("list")))
                .subcommand(Command::new("set-current").arg(id_arg()))
                .subcommand(Command::new("rm").arg(id_arg())),
        )
        .subcommand(
            Command::new("recurring")
                .about("Recurring transaction and investment templates")
                .subcommand(schedule_args(transaction_fields(Command::new("add-tx"), true)))
                .subcommand(schedule_args(
                    investment_fields(Command::new("add-invest"), true),
                ))
                .subcommand(json_flags(Command::new("list")))
                .subcommand(
                    Command::new("run")
                        .about("Generate every occurrence due on or before a date")
                        .arg(Arg::new("as_of").long("as-of").help("Defaults to today")),
                )
                .subcommand(Command::new("pause").arg(id_arg()).arg(recurring_kind_flag()))
                .subcommand(Command::new("resume").arg(id_arg()).arg(recurring_kind_flag()))
                .subcommand(Command::new("rm").arg(id_arg()).arg(recurring_kind_flag())),
        )
        .subcommand(
            Command::new("report")
                .about("Aggregated views in one currency")
                .subcommand(json_flags(range_args(
                    Command::new("summary").arg(currency_arg()),
                )))
                .subcommand(json_flags(range_args(
                    Command::new("monthly").arg(currency_arg()),
                )))
                .subcommand(json_flags(range_args(
                    Command::new("categories").arg(currency_arg()),
                )))
                .subcommand(json_flags(Command::new("portfolio").arg(currency_arg())))
                .subcommand(json_flags(range_args(
                    Command::new("electricity").arg(currency_arg()),
                ))),
        )
        .subcommand(
            Command::new("fx")
                .about("Exchange rates")
                .subcommand(Command::new("table").about("Show the built-in rate table"))
                .subcommand(
                    Command::new("rate")
                        .arg(Arg::new("from").required(true))
                        .arg(Arg::new("to").required(true)),
                )
                .subcommand(
                    Command::new("convert")
                        .arg(Arg::new("amount").required(true))
                        .arg(Arg::new("from").required(true))
                        .arg(Arg::new("to").required(true))
                        .arg(Arg::new("rate").long("rate").help("Use this snapshot rate"))
                        .arg(
                            Arg::new("live")
                                .long("live")
                                .action(ArgAction::SetTrue)
                                .help("Fetch latest ECB rates, falling back to the table"),
                        ),
                ),
        )
        .subcommand(
            Command::new("export")
                .about("Export records")
                .subcommand(
                    range_args(Command::new("transactions"))
                        .arg(
                            Arg::new("format")
                                .long("format")
                                .default_value("csv")
                                .help("csv | json"),
                        )
                        .arg(Arg::new("out").long("out").required(true)),
                ),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_is_well_formed() {
        build_cli().debug_assert();
    }

    #[test]
    fn user_flag_is_global() {
        let m = build_cli().get_matches_from(["pennyledger", "tx", "list", "--user", "alice"]);
        let (_, tx) = m.subcommand().unwrap();
        let (_, list) = tx.subcommand().unwrap();
        assert_eq!(list.get_one::<String>("user").map(String::as_str), Some("alice"));
    }
}
