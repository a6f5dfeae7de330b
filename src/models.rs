use chrono::NaiveDateTime;

/// Sentinel fund label for a display row that merges several fund mutations.
pub const MULTIPLE_FUNDS: &str = "multiple";

/// Largest single amount accepted anywhere, in rupiah (one quadrillion).
/// Keeps every ledger sum far inside `i64`.
pub const MAX_AMOUNT: i64 = 1_000_000_000_000_000;

/// The three community funds every dues payment is split across.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FundType {
    Housing,
    Social,
    Rt,
}

impl FundType {
    pub const ALL: [FundType; 3] = [FundType::Housing, FundType::Social, FundType::Rt];

    pub fn as_str(self) -> &'static str {
        match self {
            FundType::Housing => "housing",
            FundType::Social => "social",
            FundType::Rt => "rt",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FundType::Housing => "Kas Perumahan",
            FundType::Social => "Kas Sosial",
            FundType::Rt => "Kas RT",
        }
    }

    /// Returns `None` for anything that is not one of the three fixed funds.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "housing" => Some(FundType::Housing),
            "social" => Some(FundType::Social),
            "rt" => Some(FundType::Rt),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    In,
    Out,
}

impl MutationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MutationKind::In => "in",
            MutationKind::Out => "out",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "in" => Some(MutationKind::In),
            "out" => Some(MutationKind::Out),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    Pending,
    Approved,
    Rejected,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Approved => "approved",
            PaymentStatus::Rejected => "rejected",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "pending" => Some(PaymentStatus::Pending),
            "approved" => Some(PaymentStatus::Approved),
            "rejected" => Some(PaymentStatus::Rejected),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Resident,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Resident => "resident",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "admin" => Some(Role::Admin),
            "resident" => Some(Role::Resident),
            _ => None,
        }
    }
}

/// One ledger entry against a fund.
///
/// `fund_type` is kept as stored so that an unrecognized value survives into
/// the itemized list; [`Mutation::fund`] is what the fund totals look at.
/// `resident_name` is filled in by ledger queries that join the payer.
#[derive(Debug, Clone, PartialEq)]
pub struct Mutation {
    pub id: i64,
    pub kind: MutationKind,
    pub amount: i64,
    pub description: String,
    pub category: Option<String>,
    pub fund_type: Option<String>,
    pub date: Option<NaiveDateTime>,
    pub proof_image: Option<String>,
    pub payment_id: Option<i64>,
    pub resident_name: Option<String>,
}

impl Mutation {
    pub fn fund(&self) -> Option<FundType> {
        self.fund_type.as_deref().and_then(FundType::parse)
    }

    /// Signed contribution to a running balance.
    pub fn signed_amount(&self) -> i64 {
        match self.kind {
            MutationKind::In => self.amount,
            MutationKind::Out => -self.amount,
        }
    }
}

/// Input for a manually recorded mutation.
#[derive(Debug, Clone)]
pub struct NewMutation {
    pub kind: MutationKind,
    pub amount: i64,
    pub description: String,
    pub category: Option<String>,
    pub fund: Option<FundType>,
    pub date: Option<NaiveDateTime>,
    pub proof_image: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Payment {
    pub id: i64,
    pub user_id: i64,
    pub month_paid_for: String,
    pub status: PaymentStatus,
    pub proof_image: Option<String>,
    pub housing_amount: i64,
    pub social_amount: i64,
    pub rt_amount: i64,
    pub amount: i64,
    pub submitted_at: String,
    pub resident_name: Option<String>,
}

impl Payment {
    pub fn fund_amount(&self, fund: FundType) -> i64 {
        match fund {
            FundType::Housing => self.housing_amount,
            FundType::Social => self.social_amount,
            FundType::Rt => self.rt_amount,
        }
    }
}

/// The `{user_id, month_paid_for}` projection the status resolver consumes.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentMonths {
    pub user_id: i64,
    pub month_paid_for: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resident {
    pub id: i64,
    pub username: String,
    pub full_name: String,
    pub house_number: Option<String>,
    pub phone: Option<String>,
    pub occupancy_status: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Admin {
    pub id: i64,
    pub username: String,
    pub full_name: String,
}

#[derive(Debug, Clone)]
pub struct Announcement {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub category: String,
    pub date_created: String,
}
