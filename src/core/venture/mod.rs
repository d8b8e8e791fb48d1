mod actions;
mod competitors;
mod engines;
mod levers;
mod lifecycle;
mod market;
mod scorecard;
mod stage;

use serde::{Deserialize, Serialize};

pub use actions::{
    ScheduledRipple, VentureDecision, VentureSettings, adjust_venture, apply_venture_decision,
    fire_employee, hire_candidate,
};
pub use engines::EngineResult;
pub use levers::LeverEffects;
pub use market::{ad_efficiency, pricing_ceiling};
pub use scorecard::{CreditRating, GateScore, Scorecard, credit_rating};
pub use stage::{StageChange, VentureMonth, run_venture_month, update_stage};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VentureCategory {
    Goods,
    Subscription,
    Services,
}

/// Early, unmanaged progression of a side venture before it has metrics.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleStage {
    Idea,
    SmallTest,
    Growing,
    Established,
    Breakout,
    Failed,
}

impl LifecycleStage {
    pub fn index(self) -> usize {
        match self {
            LifecycleStage::Idea => 0,
            LifecycleStage::SmallTest => 1,
            LifecycleStage::Growing => 2,
            LifecycleStage::Established => 3,
            LifecycleStage::Breakout => 4,
            LifecycleStage::Failed => 0,
        }
    }

    pub fn next(self) -> Option<LifecycleStage> {
        match self {
            LifecycleStage::Idea => Some(LifecycleStage::SmallTest),
            LifecycleStage::SmallTest => Some(LifecycleStage::Growing),
            LifecycleStage::Growing => Some(LifecycleStage::Established),
            LifecycleStage::Established => Some(LifecycleStage::Breakout),
            LifecycleStage::Breakout | LifecycleStage::Failed => None,
        }
    }
}

/// Revenue-threshold stage. Only ever moves forward, except into `Failed`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VentureStage {
    Startup,
    Growth,
    Scale,
    Failed,
}

impl VentureStage {
    pub fn is_managed(self) -> bool {
        matches!(self, VentureStage::Growth | VentureStage::Scale)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityTier {
    Budget,
    Standard,
    Premium,
}

impl QualityTier {
    pub fn index(self) -> usize {
        match self {
            QualityTier::Budget => 0,
            QualityTier::Standard => 1,
            QualityTier::Premium => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Levers {
    /// 100 is the market price.
    pub price_index: f64,
    pub quality_tier: QualityTier,
    pub ad_spend: f64,
    pub product_variety: u32,
    pub rd_spend: f64,
}

impl Default for Levers {
    fn default() -> Self {
        Self {
            price_index: 100.0,
            quality_tier: QualityTier::Standard,
            ad_spend: 300.0,
            product_variety: 1,
            rd_spend: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketPositioning {
    /// Percent over market pricing.
    pub pricing_premium: f64,
    /// Percent over market wages.
    pub wage_premium: f64,
    pub quality_multiplier: f64,
    pub months_over_ceiling: u32,
}

impl Default for MarketPositioning {
    fn default() -> Self {
        Self {
            pricing_premium: 0.0,
            wage_premium: 0.0,
            quality_multiplier: 1.0,
            months_over_ceiling: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VentureMetrics {
    pub revenue: f64,
    pub cogs: f64,
    pub expenses: f64,
    pub net_profit: f64,
    pub gross_margin: f64,
    pub customers: f64,
    pub leads: f64,
    pub bonus_leads: f64,
    pub conversion_rate: f64,
    pub churn_rate: f64,
    pub arpu: f64,
    pub brand: f64,
    pub market_share: f64,
    pub quality_score: f64,
    pub mom_growth: f64,
    pub board_confidence: f64,
    pub credit_rating: CreditRating,
    pub scorecard: Option<Scorecard>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompetitorArchetype {
    Discounter,
    QualityLeader,
    GrowthHacker,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Competitor {
    pub name: String,
    pub archetype: CompetitorArchetype,
    pub price: f64,
    pub quality: f64,
    pub brand: f64,
    pub ad_spend: f64,
    pub market_share: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoadmapItem {
    pub name: String,
    pub cost: f64,
    pub progress: f64,
    pub brand_reward: f64,
    pub conversion_reward: f64,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: u64,
    pub name: String,
    pub role: String,
    pub salary: f64,
    pub skill: f64,
    pub reliability: f64,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepartmentKind {
    Sales,
    Product,
    Operations,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    pub kind: DepartmentKind,
    pub monthly_cost: f64,
    pub uplift: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialReport {
    pub age: u32,
    pub month: u32,
    pub revenue: f64,
    pub cogs: f64,
    pub expenses: f64,
    pub net_profit: f64,
    pub customers: f64,
    pub brand: f64,
    pub market_share: f64,
    pub board_confidence: f64,
    pub credit_rating: CreditRating,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub name: String,
    pub price: f64,
    pub market_price: f64,
    pub unit_cost: f64,
    pub base_demand: f64,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    Direct,
    Marketplace,
    Retail,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesChannel {
    pub kind: ChannelKind,
    pub share: f64,
    pub fee_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceBook {
    pub billable_rate: f64,
    pub utilization: f64,
    pub sub_services: u32,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdChannelKind {
    Social,
    Search,
    Print,
}

/// An advertising channel and the pricing-premium range it works best in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdChannel {
    pub kind: AdChannelKind,
    pub sweet_spot_min: f64,
    pub sweet_spot_max: f64,
}

impl AdChannel {
    pub fn for_kind(kind: AdChannelKind) -> Self {
        let (sweet_spot_min, sweet_spot_max) = match kind {
            AdChannelKind::Social => (-20.0, 10.0),
            AdChannelKind::Search => (-10.0, 25.0),
            AdChannelKind::Print => (15.0, 60.0),
        };
        Self {
            kind,
            sweet_spot_min,
            sweet_spot_max,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub id: u64,
    pub name: String,
    pub role: String,
    pub salary: f64,
    pub skill: f64,
    pub reliability: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Venture {
    pub name: String,
    pub category: VentureCategory,
    pub lifecycle: LifecycleStage,
    pub months_in_lifecycle: u32,
    pub stage: VentureStage,
    pub months_active: u32,
    pub invested: f64,
    pub monthly_revenue: f64,
    pub last_net_profit: f64,
    pub loss_streak: u32,
    pub metrics: Option<VentureMetrics>,
    pub competitors: Vec<Competitor>,
    pub levers: Levers,
    pub positioning: MarketPositioning,
    pub ad_channel: AdChannel,
    pub roadmap: Vec<RoadmapItem>,
    pub employees: Vec<Employee>,
    pub departments: Vec<Department>,
    pub financial_history: Vec<FinancialReport>,
    pub products: Vec<Product>,
    pub channels: Vec<SalesChannel>,
    pub services: Option<ServiceBook>,
    pub candidates: Vec<Candidate>,
    pub pending_decisions: Vec<VentureDecision>,
    pub next_id: u64,
}

impl Venture {
    pub fn new(name: &str, category: VentureCategory, invested: f64) -> Self {
        let (products, channels, services) = match category {
            VentureCategory::Goods => (
                vec![
                    Product {
                        name: format!("{name} Classic"),
                        price: 40.0,
                        market_price: 40.0,
                        unit_cost: 16.0,
                        base_demand: 120.0,
                    },
                    Product {
                        name: format!("{name} Plus"),
                        price: 90.0,
                        market_price: 90.0,
                        unit_cost: 40.0,
                        base_demand: 40.0,
                    },
                ],
                vec![
                    SalesChannel {
                        kind: ChannelKind::Direct,
                        share: 0.5,
                        fee_rate: 0.03,
                    },
                    SalesChannel {
                        kind: ChannelKind::Marketplace,
                        share: 0.5,
                        fee_rate: 0.15,
                    },
                ],
                None,
            ),
            VentureCategory::Subscription => (Vec::new(), Vec::new(), None),
            VentureCategory::Services => (
                Vec::new(),
                Vec::new(),
                Some(ServiceBook {
                    billable_rate: 85.0,
                    utilization: 0.6,
                    sub_services: 1,
                }),
            ),
        };
        Self {
            name: name.to_string(),
            category,
            lifecycle: LifecycleStage::Idea,
            months_in_lifecycle: 0,
            stage: VentureStage::Startup,
            months_active: 0,
            invested,
            monthly_revenue: 0.0,
            last_net_profit: 0.0,
            loss_streak: 0,
            metrics: None,
            competitors: Vec::new(),
            levers: Levers::default(),
            positioning: MarketPositioning::default(),
            ad_channel: AdChannel::for_kind(AdChannelKind::Social),
            roadmap: Vec::new(),
            employees: Vec::new(),
            departments: Vec::new(),
            financial_history: Vec::new(),
            products,
            channels,
            services,
            candidates: Vec::new(),
            pending_decisions: Vec::new(),
            next_id: 1,
        }
    }

    pub fn is_managed(&self) -> bool {
        self.stage.is_managed() && self.metrics.is_some()
    }

    pub fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn payroll(&self) -> f64 {
        self.employees.iter().map(|e| e.salary).sum()
    }

    /// Staff output in owner-equivalents: each hire counts for
    /// `reliability × (0.5 + skill/100)`, so a reliable 50-skill hire is one.
    pub fn staff_output(&self) -> f64 {
        self.employees
            .iter()
            .map(|e| e.reliability.clamp(0.0, 1.0) * (0.5 + e.skill.clamp(0.0, 100.0) / 100.0))
            .sum()
    }

    pub fn department_uplift(&self, kind: DepartmentKind) -> f64 {
        self.departments
            .iter()
            .filter(|d| d.kind == kind)
            .map(|d| d.uplift)
            .sum()
    }
}

/// Revenue per customer a category starts with on entering management.
pub(crate) fn starting_arpu(category: VentureCategory) -> f64 {
    match category {
        VentureCategory::Goods => 55.0,
        VentureCategory::Subscription => 40.0,
        VentureCategory::Services => 1_500.0,
    }
}
