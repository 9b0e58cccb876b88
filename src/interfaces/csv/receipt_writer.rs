use crate::domain::account::AccountId;
use crate::domain::money::Currency;
use crate::domain::receipt::{ReceiptSide, TransactionReceipt};
use crate::domain::transaction::{TransactionId, TransactionStatus, TransactionType};
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Serialize)]
struct ReceiptRow<'a> {
    transaction: TransactionId,
    account: AccountId,
    side: ReceiptSide,
    r#type: TransactionType,
    amount: String,
    currency: Currency,
    status: TransactionStatus,
    message: &'a str,
    date: String,
}

impl<'a> From<&'a TransactionReceipt> for ReceiptRow<'a> {
    fn from(receipt: &'a TransactionReceipt) -> Self {
        Self {
            transaction: receipt.transaction,
            account: receipt.account,
            side: receipt.side,
            r#type: receipt.kind,
            amount: format!("{:.2}", receipt.amount.amount()),
            currency: receipt.amount.currency(),
            status: receipt.status,
            message: &receipt.message,
            date: receipt.date.to_rfc3339(),
        }
    }
}

/// Writes receipts as CSV with the header
/// `transaction,account,side,type,amount,currency,status,message,date`.
pub struct ReceiptWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> ReceiptWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write(&mut self, receipt: &TransactionReceipt) -> Result<()> {
        self.writer.serialize(ReceiptRow::from(receipt))?;
        Ok(())
    }

    pub fn write_all<'r>(
        &mut self,
        receipts: impl IntoIterator<Item = &'r TransactionReceipt>,
    ) -> Result<()> {
        for receipt in receipts {
            self.write(receipt)?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
