//! Core types for the registry.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Unique identifier for an entity (student, product, research, message, log).
///
/// Ids are time-based with a random base36 suffix so that rapid successive
/// calls within the same millisecond still produce distinct ids.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(pub String);

const SUFFIX_LEN: usize = 9;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

fn random_suffix() -> String {
    let mut rng = rand::thread_rng();
    (0..SUFFIX_LEN)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect()
}

impl EntityId {
    /// Generate a fresh id from the current time plus a random suffix.
    pub fn generate() -> Self {
        EntityId(format!("{}{}", Timestamp::now().0, random_suffix()))
    }

    /// Generate an id salted with an index.
    ///
    /// Used by bulk insertion, where many ids are minted within the same
    /// millisecond and the index keeps them distinct even on suffix collision.
    pub fn generate_salted(index: usize) -> Self {
        EntityId(format!("{}{}{}", Timestamp::now().0, index, random_suffix()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        EntityId(s.to_string())
    }
}

/// Milliseconds since Unix epoch.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct Timestamp(pub i64);

impl Timestamp {
    /// Current time.
    pub fn now() -> Self {
        let duration = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("Time went backwards");
        Timestamp(duration.as_millis() as i64)
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({})", self.0)
    }
}

/// Two-digit cohort tag distinguishing intake years.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AcademicYear {
    #[serde(rename = "25")]
    Y25,
    #[serde(rename = "26")]
    Y26,
}

impl Default for AcademicYear {
    fn default() -> Self {
        AcademicYear::Y25
    }
}

impl fmt::Display for AcademicYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AcademicYear::Y25 => write!(f, "25"),
            AcademicYear::Y26 => write!(f, "26"),
        }
    }
}

/// A catalog item (book or material) with a unit price and remaining stock.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Product {
    pub id: EntityId,
    pub name: String,
    /// Unit price, positive.
    pub price: f64,
    /// Remaining stock; never goes negative.
    pub stock: u32,
    pub image: Option<String>,
}

/// A research assignment with an optional free-form deadline.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Research {
    pub id: EntityId,
    pub name: String,
    pub deadline: Option<String>,
}

/// Per-student order line for one product.
///
/// One line exists per product in the catalog; membership is reconciled by
/// the relations module whenever the catalog changes.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StudentOrder {
    pub product_id: EntityId,
    pub selected: bool,
    pub paid: bool,
    pub delivered: bool,
}

impl StudentOrder {
    pub fn new(product_id: EntityId) -> Self {
        Self {
            product_id,
            selected: false,
            paid: false,
            delivered: false,
        }
    }
}

/// Review status of a research line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResearchStatus {
    Pending,
    Reviewed,
    Accepted,
    Rejected,
}

impl Default for ResearchStatus {
    fn default() -> Self {
        ResearchStatus::Pending
    }
}

/// Per-student tracking line for one research assignment.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StudentResearch {
    pub research_id: EntityId,
    pub submitted: bool,
    pub status: ResearchStatus,
    pub file_uri: Option<String>,
}

impl StudentResearch {
    pub fn new(research_id: EntityId) -> Self {
        Self {
            research_id,
            submitted: false,
            status: ResearchStatus::Pending,
            file_uri: None,
        }
    }
}

/// A student with their order and research lines.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Student {
    pub id: EntityId,
    pub name: String,
    pub section: String,
    pub phone: String,
    pub academic_year: AcademicYear,
    pub orders: Vec<StudentOrder>,
    pub researches: Vec<StudentResearch>,
    pub notes: Vec<String>,
    pub created_at: Timestamp,
}

/// A message sent by a student to the admin.
///
/// `student_name` is a denormalized copy taken at send time; it is not
/// re-synced if the student is later renamed.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    pub id: EntityId,
    pub student_id: EntityId,
    pub student_name: String,
    pub content: String,
    pub timestamp: Timestamp,
    pub read: bool,
}

/// Category of an activity log entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogType {
    StudentAdded,
    StudentUpdated,
    StudentDeleted,
    Payment,
    Delivery,
    ResearchSubmitted,
    ProductAdded,
    ProductUpdated,
    ProductDeleted,
    AdminLogin,
    AdminLogout,
    SettingsChanged,
}

/// One entry in the activity ledger.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppLog {
    pub id: EntityId,
    #[serde(rename = "type")]
    pub log_type: LogType,
    pub description: String,
    pub timestamp: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Branding color overrides.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomColors {
    pub primary: Option<String>,
    pub secondary: Option<String>,
    pub accent: Option<String>,
}

/// Branding text overrides.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomTexts {
    pub app_title: Option<String>,
    pub college_name: Option<String>,
    pub department_name: Option<String>,
}

/// Single mutable settings record, last-write-wins.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    pub university_logo: Option<String>,
    pub college_logo: Option<String>,
    pub banner_image: Option<String>,
    pub custom_colors: Option<CustomColors>,
    pub custom_texts: Option<CustomTexts>,
    pub google_email: Option<String>,
}

/// Which flag of an order line to set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrderField {
    Selected,
    Paid,
    Delivered,
}

impl OrderField {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderField::Selected => "selected",
            OrderField::Paid => "paid",
            OrderField::Delivered => "delivered",
        }
    }
}

/// Partial update for a student. `None` fields are left untouched.
#[derive(Clone, Debug, Default)]
pub struct StudentPatch {
    pub name: Option<String>,
    pub section: Option<String>,
    pub phone: Option<String>,
    pub academic_year: Option<AcademicYear>,
    pub notes: Option<Vec<String>>,
}

impl StudentPatch {
    /// Names of the fields this patch would change.
    pub fn changed_keys(&self) -> Vec<&'static str> {
        let mut keys = Vec::new();
        if self.name.is_some() {
            keys.push("name");
        }
        if self.section.is_some() {
            keys.push("section");
        }
        if self.phone.is_some() {
            keys.push("phone");
        }
        if self.academic_year.is_some() {
            keys.push("academicYear");
        }
        if self.notes.is_some() {
            keys.push("notes");
        }
        keys
    }

    pub fn apply(&self, student: &mut Student) {
        if let Some(name) = &self.name {
            student.name = name.clone();
        }
        if let Some(section) = &self.section {
            student.section = section.clone();
        }
        if let Some(phone) = &self.phone {
            student.phone = phone.clone();
        }
        if let Some(year) = self.academic_year {
            student.academic_year = year;
        }
        if let Some(notes) = &self.notes {
            student.notes = notes.clone();
        }
    }
}

/// Partial update for a product.
#[derive(Clone, Debug, Default)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub stock: Option<u32>,
    pub image: Option<String>,
}

impl ProductPatch {
    pub fn changed_keys(&self) -> Vec<&'static str> {
        let mut keys = Vec::new();
        if self.name.is_some() {
            keys.push("name");
        }
        if self.price.is_some() {
            keys.push("price");
        }
        if self.stock.is_some() {
            keys.push("stock");
        }
        if self.image.is_some() {
            keys.push("image");
        }
        keys
    }

    pub fn apply(&self, product: &mut Product) {
        if let Some(name) = &self.name {
            product.name = name.clone();
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(stock) = self.stock {
            product.stock = stock;
        }
        if let Some(image) = &self.image {
            product.image = Some(image.clone());
        }
    }
}

/// Partial update for a research assignment.
#[derive(Clone, Debug, Default)]
pub struct ResearchPatch {
    pub name: Option<String>,
    pub deadline: Option<String>,
}

impl ResearchPatch {
    pub fn changed_keys(&self) -> Vec<&'static str> {
        let mut keys = Vec::new();
        if self.name.is_some() {
            keys.push("name");
        }
        if self.deadline.is_some() {
            keys.push("deadline");
        }
        keys
    }

    pub fn apply(&self, research: &mut Research) {
        if let Some(name) = &self.name {
            research.name = name.clone();
        }
        if let Some(deadline) = &self.deadline {
            research.deadline = Some(deadline.clone());
        }
    }
}

/// Partial update for a student's research line.
#[derive(Clone, Debug, Default)]
pub struct StudentResearchPatch {
    pub submitted: Option<bool>,
    pub status: Option<ResearchStatus>,
    pub file_uri: Option<String>,
}

impl StudentResearchPatch {
    pub fn apply(&self, line: &mut StudentResearch) {
        if let Some(submitted) = self.submitted {
            line.submitted = submitted;
        }
        if let Some(status) = self.status {
            line.status = status;
        }
        if let Some(uri) = &self.file_uri {
            line.file_uri = Some(uri.clone());
        }
    }
}

/// Partial update for settings. Top-level shallow merge.
#[derive(Clone, Debug, Default)]
pub struct SettingsPatch {
    pub university_logo: Option<String>,
    pub college_logo: Option<String>,
    pub banner_image: Option<String>,
    pub custom_colors: Option<CustomColors>,
    pub custom_texts: Option<CustomTexts>,
    pub google_email: Option<String>,
}

impl SettingsPatch {
    pub fn changed_keys(&self) -> Vec<&'static str> {
        let mut keys = Vec::new();
        if self.university_logo.is_some() {
            keys.push("universityLogo");
        }
        if self.college_logo.is_some() {
            keys.push("collegeLogo");
        }
        if self.banner_image.is_some() {
            keys.push("bannerImage");
        }
        if self.custom_colors.is_some() {
            keys.push("customColors");
        }
        if self.custom_texts.is_some() {
            keys.push("customTexts");
        }
        if self.google_email.is_some() {
            keys.push("googleEmail");
        }
        keys
    }

    pub fn apply(&self, settings: &mut AppSettings) {
        if let Some(v) = &self.university_logo {
            settings.university_logo = Some(v.clone());
        }
        if let Some(v) = &self.college_logo {
            settings.college_logo = Some(v.clone());
        }
        if let Some(v) = &self.banner_image {
            settings.banner_image = Some(v.clone());
        }
        if let Some(v) = &self.custom_colors {
            settings.custom_colors = Some(v.clone());
        }
        if let Some(v) = &self.custom_texts {
            settings.custom_texts = Some(v.clone());
        }
        if let Some(v) = &self.google_email {
            settings.google_email = Some(v.clone());
        }
    }
}
