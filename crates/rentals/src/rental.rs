use core::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use rentstock_core::{
    patch, require_non_blank, DomainError, DomainResult, Entity, Patch, RentalId, SupplierId,
};
use rentstock_parties::Supplier;

/// Rental status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RentalStatus {
    Pending,
    Active,
    Completed,
    Overdue,
    Cancelled,
}

impl RentalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RentalStatus::Pending => "pending",
            RentalStatus::Active => "active",
            RentalStatus::Completed => "completed",
            RentalStatus::Overdue => "overdue",
            RentalStatus::Cancelled => "cancelled",
        }
    }
}

impl FromStr for RentalStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RentalStatus::Pending),
            "active" => Ok(RentalStatus::Active),
            "completed" => Ok(RentalStatus::Completed),
            "overdue" => Ok(RentalStatus::Overdue),
            "cancelled" => Ok(RentalStatus::Cancelled),
            other => Err(DomainError::validation(format!("unknown rental status {other:?}"))),
        }
    }
}

/// Billing period agreed with the supplier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RentalPeriod {
    #[default]
    Daily,
    Weekly,
    Biweekly,
    Monthly,
}

impl RentalPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            RentalPeriod::Daily => "daily",
            RentalPeriod::Weekly => "weekly",
            RentalPeriod::Biweekly => "biweekly",
            RentalPeriod::Monthly => "monthly",
        }
    }
}

impl FromStr for RentalPeriod {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(RentalPeriod::Daily),
            "weekly" => Ok(RentalPeriod::Weekly),
            "biweekly" => Ok(RentalPeriod::Biweekly),
            "monthly" => Ok(RentalPeriod::Monthly),
            other => Err(DomainError::validation(format!("unknown rental period {other:?}"))),
        }
    }
}

/// Equipment rented from a supplier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rental {
    pub id: RentalId,
    pub supplier_id: SupplierId,
    pub equipment_name: String,
    pub equipment_type: Option<String>,
    pub quantity: i64,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub rental_period: RentalPeriod,
    pub daily_rate: Decimal,
    pub total_amount: Decimal,
    pub status: RentalStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Rental {
    type Id = RentalId;

    fn id(&self) -> RentalId {
        self.id
    }
}

/// Whole days billed between two instants; a same-day rental bills one day.
pub fn rental_days(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    (end - start).num_days().max(1)
}

impl Rental {
    /// Active and past its end date.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status == RentalStatus::Active && self.end_date < now
    }

    /// Mark an active rental as returned. Returns `false` if it was not active.
    pub fn complete(&mut self, now: DateTime<Utc>) -> bool {
        if self.status != RentalStatus::Active {
            return false;
        }
        self.status = RentalStatus::Completed;
        self.updated_at = now;
        true
    }

    /// Cancel the rental unless it already finished. Returns whether it changed.
    pub fn cancel(&mut self, now: DateTime<Utc>) -> bool {
        if matches!(self.status, RentalStatus::Completed | RentalStatus::Cancelled) {
            return false;
        }
        self.status = RentalStatus::Cancelled;
        self.updated_at = now;
        true
    }

    pub fn renew(&mut self, terms: &RenewRental, now: DateTime<Utc>) -> DomainResult<()> {
        let new_end = terms.resolve_end_date(self.end_date)?;
        if new_end < self.start_date {
            return Err(DomainError::validation("new end date precedes the start date"));
        }
        self.end_date = new_end;
        self.updated_at = now;
        Ok(())
    }

    pub fn set_notes(&mut self, notes: Option<String>, now: DateTime<Utc>) {
        self.notes = notes.filter(|n| !n.trim().is_empty());
        self.updated_at = now;
    }

    pub fn apply_changes(&mut self, changes: RentalChanges, now: DateTime<Utc>) -> DomainResult<()> {
        changes.validate()?;

        let mut next = self.clone();
        if let Some(supplier_id) = changes.supplier_id {
            next.supplier_id = supplier_id;
        }
        if let Some(name) = changes.equipment_name {
            next.equipment_name = name;
        }
        patch::apply(&mut next.equipment_type, changes.equipment_type);
        if let Some(quantity) = changes.quantity {
            next.quantity = quantity;
        }
        if let Some(start) = changes.start_date {
            next.start_date = start;
        }
        if let Some(end) = changes.end_date {
            next.end_date = end;
        }
        if let Some(period) = changes.rental_period {
            next.rental_period = period;
        }
        if let Some(rate) = changes.daily_rate {
            next.daily_rate = rate;
        }
        if let Some(total) = changes.total_amount {
            next.total_amount = total;
        }
        if let Some(status) = changes.status {
            next.status = status;
        }
        patch::apply(&mut next.notes, changes.notes);

        if next.end_date < next.start_date {
            return Err(DomainError::validation("endDate cannot precede startDate"));
        }

        next.updated_at = now;
        *self = next;
        Ok(())
    }
}

/// Input for registering a rental.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRental {
    pub supplier_id: SupplierId,
    pub equipment_name: String,
    #[serde(default)]
    pub equipment_type: Option<String>,
    pub quantity: i64,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[serde(default)]
    pub rental_period: RentalPeriod,
    pub daily_rate: Decimal,
    /// Defaults to `dailyRate × quantity × days` when omitted.
    #[serde(default)]
    pub total_amount: Option<Decimal>,
    #[serde(default)]
    pub status: Option<RentalStatus>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewRental {
    pub fn validate(&self) -> DomainResult<()> {
        require_non_blank("equipmentName", &self.equipment_name)?;
        validate_quantity(self.quantity)?;
        validate_amount("dailyRate", self.daily_rate)?;
        match self.total_amount {
            Some(total) => validate_amount("totalAmount", total)?,
            None if self.quoted_total().is_none() => {
                return Err(DomainError::validation("totalAmount out of range"));
            }
            None => {}
        }
        if self.end_date < self.start_date {
            return Err(DomainError::validation("endDate cannot precede startDate"));
        }
        Ok(())
    }

    /// `None` when the product of rate, quantity and days overflows.
    pub fn quoted_total(&self) -> Option<Decimal> {
        self.daily_rate
            .checked_mul(Decimal::from(self.quantity))?
            .checked_mul(Decimal::from(rental_days(self.start_date, self.end_date)))
    }

    pub fn into_rental(self, id: RentalId, now: DateTime<Utc>) -> Rental {
        let total_amount = self
            .total_amount
            .or_else(|| self.quoted_total())
            .unwrap_or(Decimal::ZERO);
        Rental {
            id,
            supplier_id: self.supplier_id,
            equipment_name: self.equipment_name,
            equipment_type: self.equipment_type.filter(|t| !t.trim().is_empty()),
            quantity: self.quantity,
            start_date: self.start_date,
            end_date: self.end_date,
            rental_period: self.rental_period,
            daily_rate: self.daily_rate,
            total_amount,
            status: self.status.unwrap_or(RentalStatus::Pending),
            notes: self.notes.filter(|n| !n.trim().is_empty()),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial rental update. Fields left `None` keep their current value;
/// `equipmentType` and `notes` are cleared by an explicit `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RentalChanges {
    pub supplier_id: Option<SupplierId>,
    pub equipment_name: Option<String>,
    #[serde(default, deserialize_with = "patch::nullable")]
    pub equipment_type: Patch<String>,
    pub quantity: Option<i64>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub rental_period: Option<RentalPeriod>,
    pub daily_rate: Option<Decimal>,
    pub total_amount: Option<Decimal>,
    pub status: Option<RentalStatus>,
    #[serde(default, deserialize_with = "patch::nullable")]
    pub notes: Patch<String>,
}

impl RentalChanges {
    pub fn validate(&self) -> DomainResult<()> {
        if let Some(name) = &self.equipment_name {
            require_non_blank("equipmentName", name)?;
        }
        if let Some(quantity) = self.quantity {
            validate_quantity(quantity)?;
        }
        if let Some(rate) = self.daily_rate {
            validate_amount("dailyRate", rate)?;
        }
        if let Some(total) = self.total_amount {
            validate_amount("totalAmount", total)?;
        }
        Ok(())
    }
}

/// Renewal terms: an explicit end date wins over a day count.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenewRental {
    pub new_end_date: Option<DateTime<Utc>>,
    pub additional_days: Option<i64>,
}

impl RenewRental {
    pub fn resolve_end_date(&self, current_end: DateTime<Utc>) -> DomainResult<DateTime<Utc>> {
        match (self.new_end_date, self.additional_days) {
            (Some(date), _) => Ok(date),
            (None, Some(days)) if days > 0 => Duration::try_days(days)
                .and_then(|d| current_end.checked_add_signed(d))
                .ok_or_else(|| DomainError::validation("additionalDays out of range")),
            (None, Some(_)) => Err(DomainError::validation("additionalDays must be positive")),
            (None, None) => Err(DomainError::validation(
                "either newEndDate or additionalDays is required",
            )),
        }
    }
}

/// Rental joined with its supplier for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RentalWithSupplier {
    #[serde(flatten)]
    pub rental: Rental,
    pub supplier: Supplier,
}

fn validate_quantity(quantity: i64) -> DomainResult<()> {
    if quantity <= 0 {
        return Err(DomainError::validation("quantity must be positive"));
    }
    Ok(())
}

fn validate_amount(field: &str, amount: Decimal) -> DomainResult<()> {
    if amount.is_sign_negative() {
        return Err(DomainError::validation(format!("{field} cannot be negative")));
    }
    Ok(())
}
