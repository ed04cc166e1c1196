use crate::storage::entity::preference::{self, ActiveModel as PreferenceActiveModel, Entity as Preference};
use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{DatabaseConnection, DbErr, EntityTrait, Set};
use serde::de::DeserializeOwned;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferenceKey {
    BrandColor,
    Language,
    SelectedFunds,
    EmailSettings,
}

impl PreferenceKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            PreferenceKey::BrandColor => "brand_color",
            PreferenceKey::Language => "language",
            PreferenceKey::SelectedFunds => "selected_funds",
            PreferenceKey::EmailSettings => "email_settings",
        }
    }
}

pub struct PreferenceRepository;

impl PreferenceRepository {
    pub async fn get(
        db: &DatabaseConnection,
        key: PreferenceKey,
    ) -> Result<Option<String>, DbErr> {
        let row = Preference::find_by_id(key.as_str().to_string()).one(db).await?;
        Ok(row.map(|m| m.value))
    }

    /// 写入或覆盖一个键
    pub async fn set(db: &DatabaseConnection, key: PreferenceKey, value: &str) -> Result<(), DbErr> {
        let now = Utc::now().timestamp();
        let model = PreferenceActiveModel {
            key: Set(key.as_str().to_string()),
            value: Set(value.to_string()),
            updated_at: Set(now),
        };
        Preference::insert(model)
            .on_conflict(
                OnConflict::column(preference::Column::Key)
                    .update_columns([preference::Column::Value, preference::Column::UpdatedAt])
                    .to_owned(),
            )
            .exec_without_returning(db)
            .await?;
        Ok(())
    }

    pub async fn remove(db: &DatabaseConnection, key: PreferenceKey) -> Result<bool, DbErr> {
        let res = Preference::delete_by_id(key.as_str().to_string()).exec(db).await?;
        Ok(res.rows_affected > 0)
    }

    /// 读取 JSON 值；内容损坏时视为不存在
    pub async fn get_json<T: DeserializeOwned>(
        db: &DatabaseConnection,
        key: PreferenceKey,
    ) -> Result<Option<T>, DbErr> {
        let Some(raw) = Self::get(db, key).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(v) => Ok(Some(v)),
            Err(e) => {
                log::warn!("偏好 {} 解析失败，已忽略: {}", key.as_str(), e);
                Ok(None)
            }
        }
    }

    pub async fn set_json<T: Serialize>(
        db: &DatabaseConnection,
        key: PreferenceKey,
        value: &T,
    ) -> Result<(), DbErr> {
        let raw = serde_json::to_string(value).map_err(|e| DbErr::Custom(e.to_string()))?;
        Self::set(db, key, &raw).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::establish_connection;

    async fn temp_db() -> (tempfile::TempDir, DatabaseConnection) {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("prefs.db").display());
        let db = establish_connection(&url).await.unwrap();
        (dir, db)
    }

    #[tokio::test]
    async fn set_overwrites_existing_value() {
        let (_dir, db) = temp_db().await;
        assert_eq!(PreferenceRepository::get(&db, PreferenceKey::Language).await.unwrap(), None);
        PreferenceRepository::set(&db, PreferenceKey::Language, "en").await.unwrap();
        PreferenceRepository::set(&db, PreferenceKey::Language, "zh-CN").await.unwrap();
        assert_eq!(
            PreferenceRepository::get(&db, PreferenceKey::Language).await.unwrap(),
            Some("zh-CN".to_string())
        );
    }

    #[tokio::test]
    async fn json_values_and_removal() {
        let (_dir, db) = temp_db().await;
        let funds = vec!["A".to_string(), "B".to_string()];
        PreferenceRepository::set_json(&db, PreferenceKey::SelectedFunds, &funds).await.unwrap();
        let back: Option<Vec<String>> =
            PreferenceRepository::get_json(&db, PreferenceKey::SelectedFunds).await.unwrap();
        assert_eq!(back, Some(funds));

        assert!(PreferenceRepository::remove(&db, PreferenceKey::SelectedFunds).await.unwrap());
        assert!(!PreferenceRepository::remove(&db, PreferenceKey::SelectedFunds).await.unwrap());
    }

    #[tokio::test]
    async fn corrupt_json_reads_as_missing() {
        let (_dir, db) = temp_db().await;
        PreferenceRepository::set(&db, PreferenceKey::EmailSettings, "{not json").await.unwrap();
        let v: Option<Vec<String>> =
            PreferenceRepository::get_json(&db, PreferenceKey::EmailSettings).await.unwrap();
        assert!(v.is_none());
    }
}
