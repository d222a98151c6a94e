//! 청구 기록.
//!
//! 결제 게이트웨이 연동은 하지 않으며, 청구서 레코드만 관리합니다.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::AccountId;
use crate::error::{CoreError, CoreResult};

/// 청구 상태.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingStatus {
    Pending,
    Completed,
    Failed,
}

impl BillingStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            BillingStatus::Pending => "pending",
            BillingStatus::Completed => "completed",
            BillingStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(BillingStatus::Pending),
            "completed" => Some(BillingStatus::Completed),
            "failed" => Some(BillingStatus::Failed),
            _ => None,
        }
    }
}

/// 결제 수단.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    CreditCard,
    BankTransfer,
    Paypal,
    Crypto,
}

impl PaymentMethod {
    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::CreditCard => "credit_card",
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::Paypal => "paypal",
            PaymentMethod::Crypto => "crypto",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "credit_card" => Some(PaymentMethod::CreditCard),
            "bank_transfer" => Some(PaymentMethod::BankTransfer),
            "paypal" => Some(PaymentMethod::Paypal),
            "crypto" => Some(PaymentMethod::Crypto),
            _ => None,
        }
    }
}

/// 청구 레코드.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingRecord {
    pub id: Uuid,
    /// 청구 대상 계정
    pub account_id: AccountId,
    pub project_id: Uuid,
    /// 청구서 번호 (유일)
    pub invoice_number: String,
    pub amount: Decimal,
    pub status: BillingStatus,
    pub method: PaymentMethod,
    pub transaction_date: DateTime<Utc>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub payment_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// 청구서 등록 입력.
#[derive(Debug, Clone, Deserialize)]
pub struct NewBillingRecord {
    pub account_id: AccountId,
    pub project_id: Uuid,
    pub invoice_number: String,
    pub amount: Decimal,
    pub method: PaymentMethod,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl BillingRecord {
    pub fn new(input: NewBillingRecord) -> CoreResult<Self> {
        let invoice_number = input.invoice_number.trim();
        if invoice_number.is_empty() {
            return Err(CoreError::Validation("Invoice number is required".to_string()));
        }
        if input.amount <= Decimal::ZERO {
            return Err(CoreError::Validation("Amount must be positive".to_string()));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            account_id: input.account_id,
            project_id: input.project_id,
            invoice_number: invoice_number.to_string(),
            amount: input.amount,
            status: BillingStatus::Pending,
            method: input.method,
            transaction_date: Utc::now(),
            due_date: input.due_date,
            payment_date: None,
            notes: input.notes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn input(amount: Decimal) -> NewBillingRecord {
        NewBillingRecord {
            account_id: AccountId::new("f1"),
            project_id: Uuid::new_v4(),
            invoice_number: "INV-001".to_string(),
            amount,
            method: PaymentMethod::BankTransfer,
            due_date: None,
            notes: None,
        }
    }

    #[test]
    fn test_new_record_is_pending() {
        let record = BillingRecord::new(input(dec!(250.00))).unwrap();
        assert_eq!(record.status, BillingStatus::Pending);
        assert!(record.payment_date.is_none());
    }

    #[test]
    fn test_amount_must_be_positive() {
        assert!(BillingRecord::new(input(dec!(0))).is_err());
        assert!(BillingRecord::new(input(dec!(-5))).is_err());
    }

    #[test]
    fn test_enum_tags_roundtrip() {
        for m in [
            PaymentMethod::CreditCard,
            PaymentMethod::BankTransfer,
            PaymentMethod::Paypal,
            PaymentMethod::Crypto,
        ] {
            assert_eq!(PaymentMethod::parse(m.as_str()), Some(m));
        }
        assert_eq!(BillingStatus::parse("failed"), Some(BillingStatus::Failed));
        assert_eq!(
            serde_json::to_string(&PaymentMethod::CreditCard).unwrap(),
            "\"credit_card\""
        );
    }
}
