use crate::application::engine::TransferRequest;
use crate::domain::account::AccountId;
use crate::domain::money::{Currency, Money};
use crate::error::{LedgerError, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
enum CommandType {
    Transfer,
    Deposit,
    PenaltyFee,
    MaintenanceFee,
}

#[derive(Debug, Deserialize)]
struct CommandRow {
    r#type: CommandType,
    source: Option<AccountId>,
    target: AccountId,
    /// Parsed from the raw text so wide or long amounts stay exact.
    #[serde(default, with = "rust_decimal::serde::str_option")]
    amount: Option<Decimal>,
    currency: Option<Currency>,
    owner: Option<String>,
}

/// One line of the batch input.
#[derive(Debug, Clone, PartialEq)]
pub enum LedgerCommand {
    Transfer(TransferRequest),
    Deposit { target: AccountId, amount: Money },
    PenaltyFee { account: AccountId },
    MaintenanceFee { account: AccountId },
}

impl CommandRow {
    fn into_command(self, line: usize) -> Result<LedgerCommand> {
        let missing = |field: &str| {
            LedgerError::InvalidRequest(format!("line {line}: {:?} row missing {field}", self.r#type))
        };
        let money = |amount: Option<Decimal>, currency: Option<Currency>| -> Result<Money> {
            Ok(Money::new(
                amount.ok_or_else(|| missing("amount"))?,
                currency.ok_or_else(|| missing("currency"))?,
            ))
        };

        match self.r#type {
            CommandType::Transfer => Ok(LedgerCommand::Transfer(TransferRequest {
                source: self.source.ok_or_else(|| missing("source"))?,
                target: self.target,
                amount: money(self.amount, self.currency)?,
                claimed_owner: self.owner.clone().ok_or_else(|| missing("owner"))?,
            })),
            CommandType::Deposit => Ok(LedgerCommand::Deposit {
                target: self.target,
                amount: money(self.amount, self.currency)?,
            }),
            CommandType::PenaltyFee => Ok(LedgerCommand::PenaltyFee {
                account: self.target,
            }),
            CommandType::MaintenanceFee => Ok(LedgerCommand::MaintenanceFee {
                account: self.target,
            }),
        }
    }
}

/// Reads ledger commands from a CSV source with the header
/// `type,source,target,amount,currency,owner`.
///
/// Whitespace is trimmed and short records are accepted, so fee rows may stop
/// after the `target` column.
pub struct CommandReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> CommandReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily yields one result per data row; a bad row does not stop the stream.
    pub fn commands(self) -> impl Iterator<Item = Result<LedgerCommand>> {
        self.reader
            .into_deserialize::<CommandRow>()
            .enumerate()
            .map(|(idx, row)| {
                // 1-indexed, after the header
                let line = idx + 2;
                row.map_err(LedgerError::from)?.into_command(line)
            })
    }
}
