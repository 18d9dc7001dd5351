use std::fmt::Display;
use std::str::FromStr;

use fxhash::FxHashSet;
use geo_types::Point;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::define_index_newtype;

define_index_newtype!(TicketIdx, Ticket);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProblemType {
    Pothole,
    WaterLeak,
    SewerLeak,
    DarkLamp,
    ExposedWiring,
    CloggedDrain,
    BrokenSidewalk,
    FaultyTrafficLight,
}

/// Shift priority. Variant order is the rank: `Emergency` sorts first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Emergency,
    Urgent,
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn rank(&self) -> u8 {
        *self as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CrewType {
    Asphalt,
    Hydraulic,
    Electric,
    Sanitation,
    General,
}

impl Display for CrewType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CrewType::Asphalt => "asphalt",
            CrewType::Hydraulic => "hydraulic",
            CrewType::Electric => "electric",
            CrewType::Sanitation => "sanitation",
            CrewType::General => "general",
        };
        write!(f, "{name}")
    }
}

impl FromStr for CrewType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "asphalt" => Ok(CrewType::Asphalt),
            "hydraulic" => Ok(CrewType::Hydraulic),
            "electric" => Ok(CrewType::Electric),
            "sanitation" => Ok(CrewType::Sanitation),
            "general" => Ok(CrewType::General),
            other => Err(format!("unknown crew type: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProblemSize {
    Small,
    Medium,
    Large,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Open,
    InProgress,
    Done,
    Cancelled,
}

/// Opaque stable ticket identifier.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct TicketId(String);

impl TicketId {
    pub fn new(id: impl Into<String>) -> Self {
        TicketId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for TicketId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Why a ticket's data cannot be routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataIssue {
    BadCoordinates,
    NonPositiveServiceTime,
}

/// One maintenance work item at a fixed location. Immutable for the
/// duration of an optimization run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    id: TicketId,
    lat: f64,
    lon: f64,
    problem_type: ProblemType,
    priority: Priority,
    crew_type: CrewType,
    problem_size: Option<ProblemSize>,
    estimated_service_minutes: u32,
    affects_traffic: bool,
    affects_commerce: bool,
    near_critical_location: bool,
    main_road: bool,
    complaints_count: u32,
    requires_road_block: bool,
    dependencies: FxHashSet<TicketId>,
    status: TicketStatus,
    /// Advisory cache written at submission time. The engine always
    /// recomputes the score per run.
    urgency_score: Option<f64>,
}

impl Ticket {
    pub fn builder(id: impl Into<String>) -> TicketBuilder {
        TicketBuilder::new(id)
    }

    pub fn id(&self) -> &TicketId {
        &self.id
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lon(&self) -> f64 {
        self.lon
    }

    /// Coordinates as a geometry point (x = lon, y = lat).
    pub fn point(&self) -> Point {
        Point::new(self.lon, self.lat)
    }

    pub fn problem_type(&self) -> ProblemType {
        self.problem_type
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn crew_type(&self) -> CrewType {
        self.crew_type
    }

    pub fn problem_size(&self) -> Option<ProblemSize> {
        self.problem_size
    }

    pub fn estimated_service_minutes(&self) -> u32 {
        self.estimated_service_minutes
    }

    pub fn affects_traffic(&self) -> bool {
        self.affects_traffic
    }

    pub fn affects_commerce(&self) -> bool {
        self.affects_commerce
    }

    pub fn near_critical_location(&self) -> bool {
        self.near_critical_location
    }

    pub fn main_road(&self) -> bool {
        self.main_road
    }

    pub fn complaints_count(&self) -> u32 {
        self.complaints_count
    }

    pub fn requires_road_block(&self) -> bool {
        self.requires_road_block
    }

    pub fn dependencies(&self) -> &FxHashSet<TicketId> {
        &self.dependencies
    }

    pub fn status(&self) -> TicketStatus {
        self.status
    }

    pub fn is_open(&self) -> bool {
        self.status == TicketStatus::Open
    }

    pub fn cached_urgency_score(&self) -> Option<f64> {
        self.urgency_score
    }

    pub fn check_data(&self) -> Result<(), DataIssue> {
        if !(-90.0..=90.0).contains(&self.lat) || !(-180.0..=180.0).contains(&self.lon) {
            return Err(DataIssue::BadCoordinates);
        }
        if self.estimated_service_minutes == 0 {
            return Err(DataIssue::NonPositiveServiceTime);
        }
        Ok(())
    }
}

pub struct TicketBuilder {
    id: TicketId,
    lat: Option<f64>,
    lon: Option<f64>,
    problem_type: ProblemType,
    priority: Priority,
    crew_type: CrewType,
    problem_size: Option<ProblemSize>,
    estimated_service_minutes: u32,
    affects_traffic: bool,
    affects_commerce: bool,
    near_critical_location: bool,
    main_road: bool,
    complaints_count: u32,
    requires_road_block: bool,
    dependencies: FxHashSet<TicketId>,
    status: TicketStatus,
    urgency_score: Option<f64>,
}

impl TicketBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        TicketBuilder {
            id: TicketId::new(id),
            lat: None,
            lon: None,
            problem_type: ProblemType::Pothole,
            priority: Priority::Medium,
            crew_type: CrewType::General,
            problem_size: None,
            estimated_service_minutes: 30,
            affects_traffic: false,
            affects_commerce: false,
            near_critical_location: false,
            main_road: false,
            complaints_count: 0,
            requires_road_block: false,
            dependencies: FxHashSet::default(),
            status: TicketStatus::Open,
            urgency_score: None,
        }
    }

    pub fn coordinates(mut self, lat: f64, lon: f64) -> Self {
        self.lat = Some(lat);
        self.lon = Some(lon);
        self
    }

    pub fn problem_type(mut self, problem_type: ProblemType) -> Self {
        self.problem_type = problem_type;
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn crew_type(mut self, crew_type: CrewType) -> Self {
        self.crew_type = crew_type;
        self
    }

    pub fn problem_size(mut self, size: ProblemSize) -> Self {
        self.problem_size = Some(size);
        self
    }

    pub fn service_minutes(mut self, minutes: u32) -> Self {
        self.estimated_service_minutes = minutes;
        self
    }

    pub fn affects_traffic(mut self, value: bool) -> Self {
        self.affects_traffic = value;
        self
    }

    pub fn affects_commerce(mut self, value: bool) -> Self {
        self.affects_commerce = value;
        self
    }

    pub fn near_critical_location(mut self, value: bool) -> Self {
        self.near_critical_location = value;
        self
    }

    pub fn main_road(mut self, value: bool) -> Self {
        self.main_road = value;
        self
    }

    pub fn complaints(mut self, count: u32) -> Self {
        self.complaints_count = count;
        self
    }

    pub fn requires_road_block(mut self, value: bool) -> Self {
        self.requires_road_block = value;
        self
    }

    pub fn depends_on(mut self, id: impl Into<String>) -> Self {
        self.dependencies.insert(TicketId::new(id));
        self
    }

    pub fn status(mut self, status: TicketStatus) -> Self {
        self.status = status;
        self
    }

    pub fn cached_urgency_score(mut self, score: f64) -> Self {
        self.urgency_score = Some(score);
        self
    }

    pub fn build(self) -> Ticket {
        Ticket {
            id: self.id,
            lat: self.lat.expect("ticket latitude not set"),
            lon: self.lon.expect("ticket longitude not set"),
            problem_type: self.problem_type,
            priority: self.priority,
            crew_type: self.crew_type,
            problem_size: self.problem_size,
            estimated_service_minutes: self.estimated_service_minutes,
            affects_traffic: self.affects_traffic,
            affects_commerce: self.affects_commerce,
            near_critical_location: self.near_critical_location,
            main_road: self.main_road,
            complaints_count: self.complaints_count,
            requires_road_block: self.requires_road_block,
            dependencies: self.dependencies,
            status: self.status,
            urgency_score: self.urgency_score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_rank_order() {
        assert!(Priority::Emergency < Priority::Urgent);
        assert!(Priority::Urgent < Priority::High);
        assert!(Priority::High < Priority::Medium);
        assert!(Priority::Medium < Priority::Low);
        assert_eq!(Priority::Emergency.rank(), 0);
        assert_eq!(Priority::Low.rank(), 4);
    }

    #[test]
    fn test_crew_type_round_trip() {
        for crew in [
            CrewType::Asphalt,
            CrewType::Hydraulic,
            CrewType::Electric,
            CrewType::Sanitation,
            CrewType::General,
        ] {
            assert_eq!(crew.to_string().parse::<CrewType>(), Ok(crew));
        }
        assert!("plumbing".parse::<CrewType>().is_err());
    }

    #[test]
    fn test_check_data() {
        let good = Ticket::builder("t1").coordinates(-23.55, -46.63).build();
        assert!(good.check_data().is_ok());

        let bad_lat = Ticket::builder("t2").coordinates(91.0, 0.0).build();
        assert_eq!(bad_lat.check_data(), Err(DataIssue::BadCoordinates));

        let no_service = Ticket::builder("t3")
            .coordinates(0.0, 0.0)
            .service_minutes(0)
            .build();
        assert_eq!(
            no_service.check_data(),
            Err(DataIssue::NonPositiveServiceTime)
        );
    }
}
