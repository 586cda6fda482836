//! In-memory account ledger
//!
//! Holds the demo account profile, its statement and the read-only catalog
//! (cards, loans, branches). Built once at startup and shared through `Arc`.
//! Balance changes only through [`debit`], and transfers run under a single
//! lock so the funds check and the mutation cannot interleave.

use crate::error::LedgerError;
use crate::models::{
    AccountProfile, AccountType, Branch, Card, CardStatus, Cards, LoanOffer, StatementLine,
    TransactionRecord,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use tracing::info;

/// Decrement the profile balance. The only mutator of `balance`.
pub fn debit(profile: &mut AccountProfile, amount: Decimal) -> Result<Decimal, LedgerError> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::NonPositiveAmount);
    }
    if amount > profile.balance {
        return Err(LedgerError::InsufficientFunds {
            available: profile.balance,
        });
    }

    profile.balance -= amount;
    Ok(profile.balance)
}

/// Attach a running balance to each record, accumulated from zero in order
pub fn running_balance(transactions: &[TransactionRecord]) -> Vec<StatementLine> {
    let mut running = Decimal::ZERO;
    transactions
        .iter()
        .map(|record| {
            running += record.amount;
            StatementLine {
                record: record.clone(),
                balance: running,
            }
        })
        .collect()
}

struct Account {
    profile: AccountProfile,
    transactions: Vec<TransactionRecord>,
}

pub struct Ledger {
    account: Mutex<Account>,
    cards: Cards,
    loans: Vec<LoanOffer>,
    branches: Vec<Branch>,
}

impl Ledger {
    pub fn new(
        profile: AccountProfile,
        transactions: Vec<TransactionRecord>,
        cards: Cards,
        loans: Vec<LoanOffer>,
        branches: Vec<Branch>,
    ) -> Self {
        Self {
            account: Mutex::new(Account {
                profile,
                transactions,
            }),
            cards,
            loans,
            branches,
        }
    }

    /// The demo account the application ships with
    pub fn demo() -> Self {
        let profile = AccountProfile {
            name: "Yesh".to_string(),
            number: "96182240".to_string(),
            account_type: AccountType::Savings,
            balance: Decimal::new(7_500_000, 2),
        };

        let transactions = vec![
            seed_txn((2025, 8, 20), "Zomato Order", Decimal::new(-45_000, 2)),
            seed_txn((2025, 8, 18), "Amazon Purchase", Decimal::new(-299_900, 2)),
            seed_txn((2025, 8, 15), "Flipkart Refund", Decimal::new(150_000, 2)),
            seed_txn((2025, 8, 10), "Rent Payment", Decimal::new(-1_500_000, 2)),
        ];

        let cards = Cards {
            debit: Card {
                status: CardStatus::Active,
                last4: "4321".to_string(),
            },
            credit: Card {
                status: CardStatus::Active,
                last4: "9988".to_string(),
            },
        };

        let loans = vec![
            LoanOffer {
                loan_type: "Personal Loan".to_string(),
                rate: "11.25% p.a.".to_string(),
            },
            LoanOffer {
                loan_type: "Home Loan".to_string(),
                rate: "8.50% p.a.".to_string(),
            },
        ];

        let branches = vec![
            seed_branch(
                "Hyderabad",
                "SRT Bank - HiTech City",
                "Plot 21, Cyber Towers",
                "SRTB0000123",
            ),
            seed_branch(
                "Bengaluru",
                "SRT Bank - Indiranagar",
                "100ft Rd, HAL 2nd Stage",
                "SRTB0000456",
            ),
            seed_branch(
                "Mumbai",
                "SRT Bank - BKC",
                "G Block, Bandra Kurla Complex",
                "SRTB0000789",
            ),
        ];

        Self::new(profile, transactions, cards, loans, branches)
    }

    pub async fn profile(&self) -> AccountProfile {
        self.account.lock().await.profile.clone()
    }

    pub async fn balance(&self) -> Decimal {
        self.account.lock().await.profile.balance
    }

    pub async fn account_number(&self) -> String {
        self.account.lock().await.profile.number.clone()
    }

    pub async fn transactions(&self) -> Vec<TransactionRecord> {
        self.account.lock().await.transactions.clone()
    }

    pub async fn statement(&self) -> Vec<StatementLine> {
        let account = self.account.lock().await;
        running_balance(&account.transactions)
    }

    /// Debit `amount` and append a "Transfer to {recipient}" record dated `date`.
    /// Returns the new balance.
    pub async fn transfer(
        &self,
        recipient: &str,
        amount: Decimal,
        date: NaiveDate,
    ) -> Result<Decimal, LedgerError> {
        let mut account = self.account.lock().await;

        let new_balance = debit(&mut account.profile, amount)?;
        account.transactions.push(TransactionRecord {
            date,
            description: format!("Transfer to {}", recipient),
            amount: -amount,
        });

        info!(%recipient, %amount, %new_balance, "Transfer applied");
        Ok(new_balance)
    }

    pub fn cards(&self) -> &Cards {
        &self.cards
    }

    pub fn loans(&self) -> &[LoanOffer] {
        &self.loans
    }

    pub fn branches(&self) -> &[Branch] {
        &self.branches
    }
}

fn seed_txn((y, m, d): (i32, u32, u32), description: &str, amount: Decimal) -> TransactionRecord {
    TransactionRecord {
        date: NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default(),
        description: description.to_string(),
        amount,
    }
}

fn seed_branch(city: &str, name: &str, address: &str, ifsc: &str) -> Branch {
    Branch {
        city: city.to_string(),
        name: name.to_string(),
        address: address.to_string(),
        ifsc: ifsc.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 9, 1).unwrap()
    }

    #[test]
    fn test_debit_rules() {
        let mut profile = Ledger::demo().account.into_inner().profile;

        assert_eq!(
            debit(&mut profile, Decimal::ZERO),
            Err(LedgerError::NonPositiveAmount)
        );
        assert_eq!(
            debit(&mut profile, Decimal::new(75_001, 0)),
            Err(LedgerError::InsufficientFunds {
                available: Decimal::new(75_000, 0)
            })
        );
        assert_eq!(debit(&mut profile, Decimal::new(75_000, 0)), Ok(Decimal::ZERO));
    }

    #[test]
    fn test_running_balance_accumulates_in_order() {
        let ledger = Ledger::demo();
        let account = ledger.account.into_inner();
        let lines = running_balance(&account.transactions);

        let balances: Vec<Decimal> = lines.iter().map(|l| l.balance).collect();
        assert_eq!(
            balances,
            vec![
                Decimal::new(-450, 0),
                Decimal::new(-3449, 0),
                Decimal::new(-1949, 0),
                Decimal::new(-16949, 0),
            ]
        );
    }

    #[tokio::test]
    async fn test_transfer_debits_and_appends() {
        let ledger = Ledger::demo();

        let new_balance = ledger
            .transfer("Asha", Decimal::new(2000, 0), today())
            .await
            .unwrap();

        assert_eq!(new_balance, Decimal::new(73_000, 0));
        assert_eq!(ledger.balance().await, Decimal::new(73_000, 0));

        let txns = ledger.transactions().await;
        assert_eq!(txns.len(), 5);
        let last = txns.last().unwrap();
        assert_eq!(last.description, "Transfer to Asha");
        assert_eq!(last.amount, Decimal::new(-2000, 0));
        assert_eq!(last.date, today());
    }

    #[tokio::test]
    async fn test_failed_transfer_leaves_account_untouched() {
        let ledger = Ledger::demo();

        let result = ledger
            .transfer("Asha", Decimal::new(100_000, 0), today())
            .await;

        assert!(matches!(result, Err(LedgerError::InsufficientFunds { .. })));
        assert_eq!(ledger.balance().await, Decimal::new(75_000, 0));
        assert_eq!(ledger.transactions().await.len(), 4);
    }
}
