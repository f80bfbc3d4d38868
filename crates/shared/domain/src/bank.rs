//! Bank feed transactions and the rule engine that categorizes them.

use std::cmp::Ordering;
use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::GENERATED_FIT_ID_PREFIX;
use crate::error::{DomainError, DomainResult};
use crate::money::Money;

labelled_enum! {
    /// Review state of an imported bank transaction.
    pub enum BankTransactionStatus {
        ForReview => "For Review",
        Categorized => "Categorized",
        Excluded => "Excluded",
        Matched => "Matched",
    }
}

/// Imported bank or card transaction. Positive amounts are deposits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct BankTransaction {
    pub id: Uuid,
    pub account_id: Uuid,
    pub transaction_date: NaiveDate,
    pub description: String,
    pub amount: Money,
    pub fit_id: String,
    pub status: BankTransactionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_account_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payee: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applied_rule_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
    pub is_reconciled: bool,
    pub created_at: DateTime<Utc>,
}

impl BankTransaction {
    /// Apply a rule outcome to this transaction.
    pub fn apply(&mut self, outcome: &RuleOutcome) {
        outcome.apply_to(
            &mut self.category_account_id,
            &mut self.category,
            &mut self.payee,
            &mut self.applied_rule_id,
            &mut self.status,
        );
    }

    /// Manually categorize against an account.
    pub fn categorize(&mut self, account_id: Uuid) -> DomainResult<()> {
        if self.status == BankTransactionStatus::Excluded {
            return Err(DomainError::validation(
                "Excluded transactions cannot be categorized",
            ));
        }
        self.category_account_id = Some(account_id);
        self.status = BankTransactionStatus::Categorized;
        Ok(())
    }

    pub fn exclude(&mut self) {
        self.status = BankTransactionStatus::Excluded;
    }
}

/// One row of a bank statement import.
#[derive(Debug, Clone, Deserialize)]
pub struct ImportedTransaction {
    pub transaction_date: NaiveDate,
    pub description: String,
    pub amount: Money,
    pub fit_id: Option<String>,
}

/// Bank transaction ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBankTransaction {
    pub id: Uuid,
    pub account_id: Uuid,
    pub transaction_date: NaiveDate,
    pub description: String,
    pub amount: Money,
    pub fit_id: String,
    pub status: BankTransactionStatus,
    pub category_account_id: Option<Uuid>,
    pub category: Option<String>,
    pub payee: Option<String>,
    pub applied_rule_id: Option<Uuid>,
}

impl NewBankTransaction {
    pub fn apply(&mut self, outcome: &RuleOutcome) {
        outcome.apply_to(
            &mut self.category_account_id,
            &mut self.category,
            &mut self.payee,
            &mut self.applied_rule_id,
            &mut self.status,
        );
    }
}

/// Result of de-duplicating an import batch.
#[derive(Debug, Clone, Default)]
pub struct ImportPlan {
    pub rows: Vec<NewBankTransaction>,
    pub skipped: usize,
}

/// Turn import rows into new transactions, skipping fit ids already on file
/// for the account or repeated within the batch.
pub fn plan_import(
    account_id: Uuid,
    existing_fit_ids: &HashSet<String>,
    rows: Vec<ImportedTransaction>,
) -> ImportPlan {
    let mut seen: HashSet<String> = HashSet::new();
    let mut plan = ImportPlan::default();

    for row in rows {
        let id = Uuid::new_v4();
        let fit_id = match row.fit_id.map(|f| f.trim().to_string()).filter(|f| !f.is_empty()) {
            Some(fit) => fit,
            None => format!("{}{}", GENERATED_FIT_ID_PREFIX, id.simple()),
        };

        if existing_fit_ids.contains(&fit_id) || !seen.insert(fit_id.clone()) {
            plan.skipped += 1;
            continue;
        }

        plan.rows.push(NewBankTransaction {
            id,
            account_id,
            transaction_date: row.transaction_date,
            description: row.description.trim().to_string(),
            amount: row.amount,
            fit_id,
            status: BankTransactionStatus::ForReview,
            category_account_id: None,
            category: None,
            payee: None,
            applied_rule_id: None,
        });
    }

    plan
}

// =============================================================================
// Rules
// =============================================================================

/// Transaction field a rule condition inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum RuleField {
    Description,
    Amount,
}

/// Comparison applied by a rule condition.
///
/// Operators this version does not know deserialize to `Unknown` and never match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub enum RuleOperator {
    Contains,
    Equals,
    StartsWith,
    GreaterThan,
    LessThan,
    #[serde(other)]
    Unknown,
}

impl RuleField {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleField::Description => "description",
            RuleField::Amount => "amount",
        }
    }
}

impl std::str::FromStr for RuleField {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "description" => Ok(RuleField::Description),
            "amount" => Ok(RuleField::Amount),
            other => Err(DomainError::validation(format!("Unknown rule field '{}'", other))),
        }
    }
}

impl RuleOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleOperator::Contains => "contains",
            RuleOperator::Equals => "equals",
            RuleOperator::StartsWith => "startsWith",
            RuleOperator::GreaterThan => "greaterThan",
            RuleOperator::LessThan => "lessThan",
            RuleOperator::Unknown => "unknown",
        }
    }

    /// Unrecognised labels become `Unknown`, matching how stored rules load.
    pub fn from_label(label: &str) -> Self {
        match label {
            "contains" => RuleOperator::Contains,
            "equals" => RuleOperator::Equals,
            "startsWith" => RuleOperator::StartsWith,
            "greaterThan" => RuleOperator::GreaterThan,
            "lessThan" => RuleOperator::LessThan,
            _ => RuleOperator::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RuleCondition {
    pub field: RuleField,
    pub operator: RuleOperator,
    pub value: String,
}

impl RuleCondition {
    /// Evaluate the condition against a transaction's description and amount.
    pub fn matches(&self, description: &str, amount: Money) -> bool {
        match self.operator {
            RuleOperator::Contains | RuleOperator::Equals | RuleOperator::StartsWith => {
                let field = match self.field {
                    RuleField::Description => description.to_lowercase(),
                    RuleField::Amount => amount.to_decimal_string(),
                };
                let target = self.value.to_lowercase();
                match self.operator {
                    RuleOperator::Contains => field.contains(&target),
                    RuleOperator::Equals => field == target,
                    _ => field.starts_with(&target),
                }
            }
            RuleOperator::GreaterThan | RuleOperator::LessThan => {
                let field = match self.field {
                    RuleField::Amount => Some(amount),
                    RuleField::Description => Money::parse(description).ok(),
                };
                let (Some(field), Ok(target)) = (field, Money::parse(&self.value)) else {
                    return false;
                };
                if self.operator == RuleOperator::GreaterThan {
                    field > target
                } else {
                    field < target
                }
            }
            RuleOperator::Unknown => false,
        }
    }
}

/// User-defined categorization rule
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct BankRule {
    pub id: Uuid,
    pub name: String,
    /// Lower values are evaluated first
    pub priority: i32,
    pub conditions: Vec<RuleCondition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assign_account_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assign_category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assign_payee: Option<String>,
    pub auto_confirm: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Rule creation / replacement data
#[derive(Debug, Clone, Deserialize)]
pub struct NewBankRule {
    pub name: String,
    pub priority: i32,
    pub conditions: Vec<RuleCondition>,
    pub assign_account_id: Option<Uuid>,
    pub assign_category: Option<String>,
    pub assign_payee: Option<String>,
    pub auto_confirm: bool,
    pub is_active: bool,
}

impl NewBankRule {
    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("Rule name is required"));
        }
        if self.conditions.is_empty() {
            return Err(DomainError::validation(
                "A rule needs at least one condition",
            ));
        }
        if self.assign_account_id.is_none()
            && self.assign_category.is_none()
            && self.assign_payee.is_none()
        {
            return Err(DomainError::validation(
                "A rule must assign an account, category, or payee",
            ));
        }
        Ok(())
    }
}

impl BankRule {
    /// Active rules with at least one condition match when every condition does.
    pub fn matches(&self, description: &str, amount: Money) -> bool {
        self.is_active
            && !self.conditions.is_empty()
            && self.conditions.iter().all(|c| c.matches(description, amount))
    }

    pub fn outcome(&self) -> RuleOutcome {
        RuleOutcome {
            rule_id: self.id,
            category_account_id: self.assign_account_id,
            category: self.assign_category.clone(),
            payee: self.assign_payee.clone(),
            confirm: self.auto_confirm && self.assign_account_id.is_some(),
        }
    }
}

/// Evaluation order: priority ascending, then oldest first, then id.
pub fn rule_order(a: &BankRule, b: &BankRule) -> Ordering {
    a.priority
        .cmp(&b.priority)
        .then(a.created_at.cmp(&b.created_at))
        .then(a.id.cmp(&b.id))
}

/// First rule, in evaluation order, that matches the transaction.
pub fn first_matching_rule<'a>(
    rules: &'a [BankRule],
    description: &str,
    amount: Money,
) -> Option<&'a BankRule> {
    let mut ordered: Vec<&BankRule> = rules.iter().collect();
    ordered.sort_by(|a, b| rule_order(a, b));
    ordered.into_iter().find(|r| r.matches(description, amount))
}

/// What a matched rule assigns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleOutcome {
    pub rule_id: Uuid,
    pub category_account_id: Option<Uuid>,
    pub category: Option<String>,
    pub payee: Option<String>,
    /// Move the transaction straight to Categorized
    pub confirm: bool,
}

impl RuleOutcome {
    fn apply_to(
        &self,
        category_account_id: &mut Option<Uuid>,
        category: &mut Option<String>,
        payee: &mut Option<String>,
        applied_rule_id: &mut Option<Uuid>,
        status: &mut BankTransactionStatus,
    ) {
        if self.category_account_id.is_some() {
            *category_account_id = self.category_account_id;
        }
        if self.category.is_some() {
            *category = self.category.clone();
        }
        if self.payee.is_some() {
            *payee = self.payee.clone();
        }
        *applied_rule_id = Some(self.rule_id);
        if self.confirm {
            *status = BankTransactionStatus::Categorized;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cond(field: RuleField, operator: RuleOperator, value: &str) -> RuleCondition {
        RuleCondition {
            field,
            operator,
            value: value.to_string(),
        }
    }

    #[test]
    fn test_text_operators_ignore_case() {
        let amount = Money::from_cents(-4599);
        assert!(cond(RuleField::Description, RuleOperator::Contains, "zoom").matches("ZOOM.US 888", amount));
        assert!(cond(RuleField::Description, RuleOperator::StartsWith, "Zoom").matches("zoom.us", amount));
        assert!(cond(RuleField::Description, RuleOperator::Equals, "ZOOM.US").matches("zoom.us", amount));
        assert!(!cond(RuleField::Description, RuleOperator::Equals, "zoom").matches("zoom.us", amount));
    }

    #[test]
    fn test_amount_comparisons() {
        let amount = Money::from_cents(5000);
        assert!(cond(RuleField::Amount, RuleOperator::GreaterThan, "49.99").matches("", amount));
        assert!(!cond(RuleField::Amount, RuleOperator::GreaterThan, "50").matches("", amount));
        assert!(cond(RuleField::Amount, RuleOperator::LessThan, "50.01").matches("", amount));
        assert!(!cond(RuleField::Amount, RuleOperator::LessThan, "50.00").matches("", amount));
        assert!(!cond(RuleField::Amount, RuleOperator::LessThan, "lots").matches("", amount));
        assert!(cond(RuleField::Amount, RuleOperator::Equals, "50.00").matches("", amount));
    }

    #[test]
    fn test_unknown_operator_never_matches() {
        let parsed: RuleCondition =
            serde_json::from_str(r#"{"field":"description","operator":"regex","value":".*"}"#).unwrap();
        assert_eq!(parsed.operator, RuleOperator::Unknown);
        assert!(!parsed.matches("anything", Money::ZERO));
    }

    #[test]
    fn test_operator_wire_names() {
        let parsed: RuleCondition =
            serde_json::from_str(r#"{"field":"amount","operator":"startsWith","value":"1"}"#).unwrap();
        assert_eq!(parsed.operator, RuleOperator::StartsWith);
        assert_eq!(parsed.field, RuleField::Amount);
    }
}
