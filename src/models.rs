//! Privy Data Models
//!
//! 서버 JSON(camelCase)과 매핑되는 사용자 프로필 / 히스토리 데이터 모델

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 기본 신원 정보
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BasicInfo {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email_address: Option<String>,
    pub phone_number: Option<String>,
    pub birth_day: Option<NaiveDate>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub postal_code: Option<String>,
}

/// 소셜 계정
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SocialInfo {
    pub facebook: Option<String>,
    pub google_plus: Option<String>,
    pub instagram: Option<String>,
    pub snapchat: Option<String>,
    pub twitter: Option<String>,
}

/// 개발자 계정
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeveloperInfo {
    pub bitbucket: Option<String>,
    pub github: Option<String>,
    pub stackoverflow: Option<String>,
}

/// 비즈니스 연락처
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BusinessInfo {
    pub email_address: Option<String>,
    pub linkedin: Option<String>,
    pub phone_number: Option<String>,
}

/// 블로그
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BloggingInfo {
    pub medium: Option<String>,
    pub tumblr: Option<String>,
    pub website: Option<String>,
    pub wordpress: Option<String>,
}

/// 미디어 계정
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MediaInfo {
    pub flickr: Option<String>,
    pub pintrest: Option<String>,
    pub soundcloud: Option<String>,
    pub vimeo: Option<String>,
    pub vine: Option<String>,
    pub youtube: Option<String>,
}

/// 교환된 연락처 카드 (히스토리 엔트리 한 건)
///
/// 모든 필드는 선택 사항이며, 알 수 없는 필드는 무시합니다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContactCard {
    pub uuid: Option<String>,
    pub basic: BasicInfo,
    pub social: SocialInfo,
    pub developer: DeveloperInfo,
    pub business: BusinessInfo,
    pub blogging: BloggingInfo,
    pub media: MediaInfo,
}

/// 히스토리 엔트리 = 상대방의 연락처 카드
pub type HistoryEntry = ContactCard;

/// 최신순으로 정렬된 히스토리 목록
pub type HistoryList = Vec<HistoryEntry>;

impl ContactCard {
    /// 원격 삭제에 사용할 uuid (비어 있으면 None)
    pub fn resolved_uuid(&self) -> Option<&str> {
        self.uuid.as_deref().filter(|id| !id.trim().is_empty())
    }

    /// "이름 성" 형태의 표시 이름
    pub fn display_name(&self) -> String {
        let first = self.basic.first_name.as_deref().unwrap_or("");
        let last = self.basic.last_name.as_deref().unwrap_or("");
        format!("{} {}", first, last).trim().to_string()
    }

    /// 채워진 연락 수단의 개수 (목록의 "N contact methods" 표시용)
    ///
    /// 이름/uuid는 연락 수단이 아니므로 제외합니다.
    pub fn contact_method_count(&self) -> usize {
        let b = &self.basic;
        let birth_day = b.birth_day.map(|d| d.to_string());

        let fields: [Option<&str>; 29] = [
            b.email_address.as_deref(),
            b.phone_number.as_deref(),
            birth_day.as_deref(),
            b.address_line1.as_deref(),
            b.address_line2.as_deref(),
            b.city.as_deref(),
            b.country.as_deref(),
            b.postal_code.as_deref(),
            self.blogging.medium.as_deref(),
            self.blogging.tumblr.as_deref(),
            self.blogging.website.as_deref(),
            self.blogging.wordpress.as_deref(),
            self.business.email_address.as_deref(),
            self.business.linkedin.as_deref(),
            self.business.phone_number.as_deref(),
            self.developer.bitbucket.as_deref(),
            self.developer.github.as_deref(),
            self.developer.stackoverflow.as_deref(),
            self.media.flickr.as_deref(),
            self.media.pintrest.as_deref(),
            self.media.soundcloud.as_deref(),
            self.media.vimeo.as_deref(),
            self.media.vine.as_deref(),
            self.media.youtube.as_deref(),
            self.social.facebook.as_deref(),
            self.social.google_plus.as_deref(),
            self.social.instagram.as_deref(),
            self.social.snapchat.as_deref(),
            self.social.twitter.as_deref(),
        ];

        fields
            .iter()
            .filter(|f| f.map_or(false, |v| !v.is_empty()))
            .count()
    }

    /// 기본 이메일의 md5 해시 (아바타 조회 키)
    pub fn email_digest(&self) -> Option<String> {
        let email = self.basic.email_address.as_deref()?.trim();
        if email.is_empty() {
            return None;
        }
        Some(format!("{:x}", md5::compute(email.to_lowercase())))
    }
}

/// 가입 정보
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegistrationInfo {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
}

/// 현재 로그인한 사용자의 프로필
///
/// 계정 식별자는 `registrationInformation.email` 입니다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProfile {
    pub registration_information: Option<RegistrationInfo>,
    pub info_types: ContactCard,
}

impl UserProfile {
    /// 저장 경로와 키체인 계정을 결정하는 이메일 (비어 있으면 None)
    pub fn account_email(&self) -> Option<&str> {
        self.registration_information
            .as_ref()?
            .email
            .as_deref()
            .map(str::trim)
            .filter(|email| !email.is_empty())
    }
}

/// 로그인 자격 증명 (계정 이메일 + 사용자 입력 비밀번호)
///
/// 비밀번호는 암호화 키로 사용되지 않습니다. 실제 키는 키체인에서 조회합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginCredential {
    pub email: String,
    pub password: String,
}

impl LoginCredential {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}
