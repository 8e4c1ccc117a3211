use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use super::calendar::clock_time;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegistrationId(pub String);

/// Opaque, unique number printed on the applicant's paperwork.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegistrationNumber(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OfficiantId(pub String);

impl fmt::Display for RegistrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for RegistrationNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for OfficiantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Registration lifecycle. Declaration order is the happy path, so `Ord` ranks progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RegistrationStatus {
    #[serde(rename = "Draft")]
    Draft,
    #[serde(rename = "Menunggu Verifikasi")]
    AwaitingFormReview,
    #[serde(rename = "Menunggu Pengumpulan Berkas")]
    AwaitingDocumentSubmission,
    #[serde(rename = "Berkas Diterima")]
    DocumentsReceived,
    #[serde(rename = "Menunggu Penugasan")]
    AwaitingOfficiantAssignment,
    #[serde(rename = "Penghulu Ditugaskan")]
    OfficiantAssigned,
    #[serde(rename = "Menunggu Verifikasi Penghulu")]
    AwaitingOfficiantVerification,
    #[serde(rename = "Menunggu Bimbingan")]
    AwaitingCounseling,
    #[serde(rename = "Sudah Bimbingan")]
    CounselingDone,
    #[serde(rename = "Selesai")]
    Completed,
    #[serde(rename = "Ditolak")]
    Rejected,
}

impl RegistrationStatus {
    pub const ALL: [Self; 11] = [
        Self::Draft,
        Self::AwaitingFormReview,
        Self::AwaitingDocumentSubmission,
        Self::DocumentsReceived,
        Self::AwaitingOfficiantAssignment,
        Self::OfficiantAssigned,
        Self::AwaitingOfficiantVerification,
        Self::AwaitingCounseling,
        Self::CounselingDone,
        Self::Completed,
        Self::Rejected,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Draft => "Draft",
            Self::AwaitingFormReview => "Menunggu Verifikasi",
            Self::AwaitingDocumentSubmission => "Menunggu Pengumpulan Berkas",
            Self::DocumentsReceived => "Berkas Diterima",
            Self::AwaitingOfficiantAssignment => "Menunggu Penugasan",
            Self::OfficiantAssigned => "Penghulu Ditugaskan",
            Self::AwaitingOfficiantVerification => "Menunggu Verifikasi Penghulu",
            Self::AwaitingCounseling => "Menunggu Bimbingan",
            Self::CounselingDone => "Sudah Bimbingan",
            Self::Completed => "Selesai",
            Self::Rejected => "Ditolak",
        }
    }

    pub fn from_label(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL.into_iter().find(|status| status.label() == raw)
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Rejected)
    }

    /// Statuses that only the assignment operations may set.
    pub const fn is_assignment_related(self) -> bool {
        matches!(
            self,
            Self::AwaitingOfficiantAssignment
                | Self::OfficiantAssigned
                | Self::AwaitingOfficiantVerification
        )
    }

    /// An officiant is committed to the date; counts toward daily quotas.
    pub const fn holds_schedule(self) -> bool {
        matches!(
            self,
            Self::OfficiantAssigned
                | Self::AwaitingOfficiantVerification
                | Self::AwaitingCounseling
                | Self::CounselingDone
                | Self::Completed
        )
    }

    /// Still in online review; rendered yellow on the calendar.
    pub const fn is_early_review(self) -> bool {
        matches!(
            self,
            Self::AwaitingFormReview | Self::AwaitingDocumentSubmission
        )
    }
}

impl fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CounselingStatus {
    #[serde(rename = "Belum")]
    NotYet,
    #[serde(rename = "Sudah")]
    Done,
    #[serde(rename = "Sertifikat Diterbitkan")]
    CertificateIssued,
}

impl CounselingStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::NotYet => "Belum",
            Self::Done => "Sudah",
            Self::CertificateIssued => "Sertifikat Diterbitkan",
        }
    }
}

/// Guardian relations, most to least eligible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GuardianRelation {
    #[serde(rename = "Ayah Kandung")]
    BiologicalFather,
    #[serde(rename = "Kakek")]
    PaternalGrandfather,
    #[serde(rename = "Saudara Laki-Laki Kandung")]
    FullBrother,
    #[serde(rename = "Saudara Laki-Laki Seayah")]
    PaternalHalfBrother,
    #[serde(rename = "Keponakan Laki-Laki")]
    Nephew,
    #[serde(rename = "Paman Kandung")]
    PaternalUncle,
    #[serde(rename = "Paman Seayah")]
    PaternalHalfUncle,
    #[serde(rename = "Sepupu Laki-Laki")]
    PaternalCousin,
    #[serde(rename = "Wali Hakim")]
    CourtAppointed,
    #[serde(rename = "Lainnya")]
    Other,
}

impl GuardianRelation {
    pub const PRECEDENCE: [Self; 10] = [
        Self::BiologicalFather,
        Self::PaternalGrandfather,
        Self::FullBrother,
        Self::PaternalHalfBrother,
        Self::Nephew,
        Self::PaternalUncle,
        Self::PaternalHalfUncle,
        Self::PaternalCousin,
        Self::CourtAppointed,
        Self::Other,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::BiologicalFather => "Ayah Kandung",
            Self::PaternalGrandfather => "Kakek",
            Self::FullBrother => "Saudara Laki-Laki Kandung",
            Self::PaternalHalfBrother => "Saudara Laki-Laki Seayah",
            Self::Nephew => "Keponakan Laki-Laki",
            Self::PaternalUncle => "Paman Kandung",
            Self::PaternalHalfUncle => "Paman Seayah",
            Self::PaternalCousin => "Sepupu Laki-Laki",
            Self::CourtAppointed => "Wali Hakim",
            Self::Other => "Lainnya",
        }
    }

    pub fn from_label(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::PRECEDENCE
            .into_iter()
            .find(|relation| relation.label() == raw)
    }

    /// Zero-based position in the precedence order.
    pub fn rank(self) -> usize {
        Self::PRECEDENCE
            .iter()
            .position(|relation| *relation == self)
            .unwrap_or(Self::PRECEDENCE.len())
    }
}

/// Alive/deceased marker for a guardian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifeStatus {
    #[serde(rename = "Hidup")]
    Alive,
    #[serde(rename = "Meninggal")]
    Deceased,
}

impl LifeStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Alive => "Hidup",
            Self::Deceased => "Meninggal",
        }
    }

    pub fn from_label(raw: &str) -> Option<Self> {
        match raw.trim() {
            "Hidup" => Some(Self::Alive),
            "Meninggal" => Some(Self::Deceased),
            _ => None,
        }
    }
}

/// Presence of a parent on the form; only `Alive` parents are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParentPresence {
    #[serde(rename = "Hidup")]
    Alive,
    #[serde(rename = "Meninggal")]
    Deceased,
    #[serde(rename = "Tidak Diketahui")]
    Unknown,
}

impl ParentPresence {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Alive => "Hidup",
            Self::Deceased => "Meninggal",
            Self::Unknown => "Tidak Diketahui",
        }
    }

    pub fn from_label(raw: &str) -> Option<Self> {
        match raw.trim() {
            "Hidup" => Some(Self::Alive),
            "Meninggal" => Some(Self::Deceased),
            "Tidak Diketahui" => Some(Self::Unknown),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GuardianAttendance {
    #[serde(rename = "Belum Diketahui")]
    Unconfirmed,
    #[serde(rename = "Hadir")]
    Present,
    #[serde(rename = "Tidak Hadir")]
    Absent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Citizenship {
    #[serde(rename = "WNI")]
    Indonesian,
    #[serde(rename = "WNA")]
    Foreign,
}

impl Citizenship {
    pub fn from_label(raw: &str) -> Option<Self> {
        match raw.trim() {
            "WNI" => Some(Self::Indonesian),
            "WNA" => Some(Self::Foreign),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaritalStatus {
    #[serde(rename = "Belum Kawin")]
    NeverMarried,
    #[serde(rename = "Kawin")]
    Married,
    #[serde(rename = "Cerai Hidup")]
    Divorced,
    #[serde(rename = "Cerai Mati")]
    Widowed,
}

impl MaritalStatus {
    pub fn from_label(raw: &str) -> Option<Self> {
        match raw.trim() {
            "Belum Kawin" => Some(Self::NeverMarried),
            "Kawin" => Some(Self::Married),
            "Cerai Hidup" => Some(Self::Divorced),
            "Cerai Mati" => Some(Self::Widowed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "user_biasa")]
    Applicant,
    #[serde(rename = "penghulu")]
    Officiant,
    #[serde(rename = "staff")]
    Staff,
    #[serde(rename = "kepala_kua")]
    HeadOfOffice,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Applicant => "user_biasa",
            Self::Officiant => "penghulu",
            Self::Staff => "staff",
            Self::HeadOfOffice => "kepala_kua",
        }
    }

    pub fn from_label(raw: &str) -> Option<Self> {
        match raw.trim() {
            "user_biasa" => Some(Self::Applicant),
            "penghulu" => Some(Self::Officiant),
            "staff" => Some(Self::Staff),
            "kepala_kua" => Some(Self::HeadOfOffice),
            _ => None,
        }
    }
}

/// Caller identity as resolved by the transport layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: UserId,
    pub role: Role,
}

impl Actor {
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self {
            id: UserId(id.into()),
            role,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

pub const OFFICE_ADDRESS: &str = "KUA Kecamatan Banjarmasin Utara, Kelurahan Pangeran, Kecamatan Banjarmasin Utara, Kota Banjarmasin, Kalimantan Selatan";

pub const OFFICE_COORDINATES: Coordinates = Coordinates {
    latitude: -3.3148,
    longitude: 114.5925,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VenueKind {
    AtOffice,
    Offsite,
}

impl VenueKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::AtOffice => "Di KUA",
            Self::Offsite => "Di Luar KUA",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Venue {
    AtOffice,
    Offsite {
        address: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        coordinates: Option<Coordinates>,
    },
}

impl Venue {
    pub fn kind(&self) -> VenueKind {
        match self {
            Venue::AtOffice => VenueKind::AtOffice,
            Venue::Offsite { .. } => VenueKind::Offsite,
        }
    }

    pub fn is_office(&self) -> bool {
        matches!(self, Venue::AtOffice)
    }

    pub fn address(&self) -> &str {
        match self {
            Venue::AtOffice => OFFICE_ADDRESS,
            Venue::Offsite { address, .. } => address,
        }
    }

    pub fn coordinates(&self) -> Option<Coordinates> {
        match self {
            Venue::AtOffice => Some(OFFICE_COORDINATES),
            Venue::Offsite { coordinates, .. } => *coordinates,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Party {
    Groom,
    Bride,
}

impl Party {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Groom => "calon suami",
            Self::Bride => "calon istri",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParentRole {
    Father,
    Mother,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonProfile {
    pub nik: String,
    pub full_name: String,
    pub birthplace: String,
    pub birthdate: NaiveDate,
    pub citizenship: Citizenship,
    pub passport_number: Option<String>,
    pub religion: String,
    pub education: String,
    pub occupation: String,
    pub occupation_description: Option<String>,
    pub marital_status: MaritalStatus,
    pub address: String,
    pub phone: String,
    pub email: String,
}

/// Stored only for parents marked alive on the form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentRecord {
    pub party: Party,
    pub role: ParentRole,
    pub nik: Option<String>,
    pub name: String,
    pub citizenship: Citizenship,
    pub country_of_origin: Option<String>,
    pub passport_number: Option<String>,
    pub religion: String,
    pub occupation: String,
    pub occupation_description: Option<String>,
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guardian {
    pub nik: String,
    pub full_name: String,
    pub relation: GuardianRelation,
    pub life_status: LifeStatus,
    pub attendance: GuardianAttendance,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// One entry of the per-registration audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub from: RegistrationStatus,
    pub to: RegistrationStatus,
    pub actor: UserId,
    pub at: NaiveDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// The registration row plus the profiles created with it in one atomic write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationRecord {
    pub id: RegistrationId,
    pub number: RegistrationNumber,
    pub applicant: UserId,
    pub groom: PersonProfile,
    pub bride: PersonProfile,
    pub parents: Vec<ParentRecord>,
    pub guardian: Guardian,
    pub submitted_at: NaiveDateTime,
    pub wedding_date: NaiveDate,
    #[serde(with = "clock_time")]
    pub wedding_time: NaiveTime,
    pub venue: Venue,
    pub dispensation_number: Option<String>,
    pub status: RegistrationStatus,
    pub counseling_status: CounselingStatus,
    pub officiant: Option<OfficiantId>,
    pub assigned_by: Option<UserId>,
    pub assigned_at: Option<NaiveDateTime>,
    pub notes: Option<String>,
    pub approved_by: Option<UserId>,
    pub approved_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    #[serde(default)]
    pub history: Vec<StatusChange>,
}

impl RegistrationRecord {
    pub fn is_active(&self) -> bool {
        !self.status.is_terminal()
    }

    pub fn parent(&self, party: Party, role: ParentRole) -> Option<&ParentRecord> {
        self.parents
            .iter()
            .find(|parent| parent.party == party && parent.role == role)
    }

    /// Status held just before the registration was rejected.
    pub fn status_before_rejection(&self) -> Option<RegistrationStatus> {
        if self.status != RegistrationStatus::Rejected {
            return None;
        }
        self.history
            .iter()
            .rev()
            .find(|change| change.to == RegistrationStatus::Rejected)
            .map(|change| change.from)
    }

    pub fn summary(&self) -> RegistrationSummary {
        RegistrationSummary {
            id: self.id.clone(),
            number: self.number.clone(),
            status: self.status.label(),
            counseling_status: self.counseling_status.label(),
            wedding_date: self.wedding_date,
            wedding_time: super::calendar::format_clock_time(self.wedding_time),
            venue: self.venue.kind().label(),
            address: self.venue.address().to_string(),
            officiant: self.officiant.clone(),
            dispensation_number: self.dispensation_number.clone(),
        }
    }
}

/// Public view returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct RegistrationSummary {
    pub id: RegistrationId,
    pub number: RegistrationNumber,
    pub status: &'static str,
    pub counseling_status: &'static str,
    pub wedding_date: NaiveDate,
    pub wedding_time: String,
    pub venue: &'static str,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub officiant: Option<OfficiantId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dispensation_number: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OfficiantStatus {
    #[serde(rename = "Aktif")]
    Active,
    #[serde(rename = "Tidak Aktif")]
    Inactive,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Officiant {
    pub id: OfficiantId,
    pub user_id: UserId,
    pub name: String,
    pub status: OfficiantStatus,
    pub weddings_performed: u32,
    pub rating: f32,
}

impl Officiant {
    pub fn is_active(&self) -> bool {
        self.status == OfficiantStatus::Active
    }
}
