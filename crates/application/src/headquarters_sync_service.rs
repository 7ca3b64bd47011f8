//! Reconciliation between the organization profile and the headquarters
//! branch.
//!
//! Both directions are read-merge-write, never blind overwrite, so fields
//! that exist on only one side survive a round trip. Push operations are
//! serialized through an internal mutex and land through the branch
//! repository's conditional headquarters insert, so two racing pushes cannot
//! create a second headquarters.

use std::sync::Arc;

use ekklesia_core::{AppError, AppResult};
use ekklesia_domain::{Branch, OrgProfile};

use crate::{BranchRepository, Clock, OrgProfileRepository};

/// Keeps the organization profile and the headquarters branch consistent.
#[derive(Clone)]
pub struct HeadquartersSyncService {
    branches: Arc<dyn BranchRepository>,
    profiles: Arc<dyn OrgProfileRepository>,
    clock: Arc<dyn Clock>,
    push_guard: Arc<tokio::sync::Mutex<()>>,
}

impl HeadquartersSyncService {
    /// Creates a new synchronization service.
    #[must_use]
    pub fn new(
        branches: Arc<dyn BranchRepository>,
        profiles: Arc<dyn OrgProfileRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            branches,
            profiles,
            clock,
            push_guard: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    /// Pushes the profile's org-identity fields onto the headquarters branch.
    ///
    /// Invoked after every profile save. When no headquarters exists yet, one
    /// is created from the profile with zero members, active status, and a
    /// founding date of now. Idempotent.
    pub async fn push(&self) -> AppResult<()> {
        let _serialized = self.push_guard.lock().await;

        let profile = self.profiles.load().await?.ok_or_else(|| {
            AppError::NotFound("organization profile is not configured".to_owned())
        })?;

        match self.branches.find_headquarters().await? {
            Some(mut headquarters) => {
                headquarters.absorb_profile(&profile);
                self.branches.upsert_branch(headquarters).await?;
            }
            None => {
                let candidate = Branch::headquarters_from_profile(&profile, self.clock.now());
                let candidate_id = candidate.id;
                let stored = self.branches.insert_headquarters_if_absent(candidate).await?;

                if stored.id == candidate_id {
                    tracing::info!(branch = %stored.id, "created headquarters branch from profile");
                } else {
                    // Another writer inserted first; merge into the winner.
                    let mut headquarters = stored;
                    headquarters.absorb_profile(&profile);
                    self.branches.upsert_branch(headquarters).await?;
                }
            }
        }

        Ok(())
    }

    /// Pulls the headquarters branch's org-identity fields into the profile.
    ///
    /// Explicit administrator action. Fails when no headquarters branch
    /// exists. Profile-only presentation fields are preserved; an
    /// organization with no profile yet gets one built from the branch.
    pub async fn pull(&self) -> AppResult<()> {
        let headquarters = self
            .branches
            .find_headquarters()
            .await?
            .ok_or_else(|| AppError::NotFound("no headquarters branch exists".to_owned()))?;

        let profile = match self.profiles.load().await? {
            Some(mut profile) => {
                profile.absorb_branch(&headquarters);
                profile
            }
            None => OrgProfile::from_branch(&headquarters),
        };

        self.profiles.save(profile).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone, Utc};
    use ekklesia_core::{AppResult, BranchId, NonEmptyString};
    use ekklesia_domain::{Address, Branch, BranchStatus, BrandColors, OrgProfile};
    use tokio::sync::Mutex;

    use crate::{BranchRepository, Clock, OrgProfileRepository};

    use super::HeadquartersSyncService;

    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    fn test_clock() -> Arc<FixedClock> {
        let instant = Utc
            .with_ymd_and_hms(2026, 5, 1, 12, 0, 0)
            .single()
            .unwrap_or_else(|| panic!("test"));
        Arc::new(FixedClock(instant))
    }

    #[derive(Default)]
    struct FakeBranchStore {
        branches: Mutex<Vec<Branch>>,
    }

    #[async_trait]
    impl BranchRepository for FakeBranchStore {
        async fn list_branches(&self) -> AppResult<Vec<Branch>> {
            Ok(self.branches.lock().await.clone())
        }

        async fn find_branch(&self, branch_id: BranchId) -> AppResult<Option<Branch>> {
            Ok(self
                .branches
                .lock()
                .await
                .iter()
                .find(|branch| branch.id == branch_id)
                .cloned())
        }

        async fn find_headquarters(&self) -> AppResult<Option<Branch>> {
            Ok(self
                .branches
                .lock()
                .await
                .iter()
                .find(|branch| branch.is_headquarters)
                .cloned())
        }

        async fn upsert_branch(&self, branch: Branch) -> AppResult<()> {
            let mut branches = self.branches.lock().await;
            branches.retain(|existing| existing.id != branch.id);
            branches.push(branch);
            Ok(())
        }

        async fn insert_headquarters_if_absent(&self, candidate: Branch) -> AppResult<Branch> {
            let mut branches = self.branches.lock().await;
            if let Some(existing) = branches.iter().find(|branch| branch.is_headquarters) {
                return Ok(existing.clone());
            }
            branches.push(candidate.clone());
            Ok(candidate)
        }
    }

    #[derive(Default)]
    struct FakeProfileStore {
        profile: Mutex<Option<OrgProfile>>,
    }

    #[async_trait]
    impl OrgProfileRepository for FakeProfileStore {
        async fn load(&self) -> AppResult<Option<OrgProfile>> {
            Ok(self.profile.lock().await.clone())
        }

        async fn save(&self, profile: OrgProfile) -> AppResult<()> {
            *self.profile.lock().await = Some(profile);
            Ok(())
        }
    }

    fn sample_profile(name: &str) -> OrgProfile {
        OrgProfile {
            name: NonEmptyString::new(name).unwrap_or_else(|_| panic!("test")),
            short_name: "ORG".to_owned(),
            address: Address {
                street: "Av. da República 10".to_owned(),
                city: "Porto".to_owned(),
                region: "Porto".to_owned(),
                postal_code: "4000-001".to_owned(),
                country: "PT".to_owned(),
            },
            leader_name: "Pr. Almeida".to_owned(),
            tax_id: Some("501234567".to_owned()),
            brand: BrandColors {
                primary: "#0a0a0a".to_owned(),
                secondary: "#fafafa".to_owned(),
            },
        }
    }

    fn service(
        branches: Arc<FakeBranchStore>,
        profiles: Arc<FakeProfileStore>,
    ) -> HeadquartersSyncService {
        HeadquartersSyncService::new(branches, profiles, test_clock())
    }

    #[tokio::test]
    async fn push_creates_headquarters_when_none_exists() {
        let branches = Arc::new(FakeBranchStore::default());
        let profiles = Arc::new(FakeProfileStore::default());
        profiles
            .save(sample_profile("Assembleia Central"))
            .await
            .unwrap_or_else(|_| panic!("test"));

        let service = service(branches.clone(), profiles);
        assert!(service.push().await.is_ok());

        let stored = branches.branches.lock().await;
        assert_eq!(stored.len(), 1);
        assert!(stored[0].is_headquarters);
        assert_eq!(stored[0].member_count, 0);
        assert_eq!(stored[0].status, BranchStatus::Active);
        assert_eq!(stored[0].name.as_str(), "Assembleia Central");
    }

    #[tokio::test]
    async fn push_twice_keeps_a_single_headquarters() {
        let branches = Arc::new(FakeBranchStore::default());
        let profiles = Arc::new(FakeProfileStore::default());
        profiles
            .save(sample_profile("Assembleia Central"))
            .await
            .unwrap_or_else(|_| panic!("test"));

        let service = service(branches.clone(), profiles);
        assert!(service.push().await.is_ok());
        assert!(service.push().await.is_ok());

        let stored = branches.branches.lock().await;
        let headquarters_count = stored.iter().filter(|branch| branch.is_headquarters).count();
        assert_eq!(headquarters_count, 1);
    }

    #[tokio::test]
    async fn push_merges_into_existing_headquarters_preserving_branch_fields() {
        let branches = Arc::new(FakeBranchStore::default());
        let profiles = Arc::new(FakeProfileStore::default());
        profiles
            .save(sample_profile("Assembleia Central"))
            .await
            .unwrap_or_else(|_| panic!("test"));

        let service = service(branches.clone(), profiles.clone());
        assert!(service.push().await.is_ok());

        {
            let mut stored = branches.branches.lock().await;
            stored[0].member_count = 412;
        }

        profiles
            .save(sample_profile("Assembleia Renomeada"))
            .await
            .unwrap_or_else(|_| panic!("test"));
        assert!(service.push().await.is_ok());

        let stored = branches.branches.lock().await;
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].name.as_str(), "Assembleia Renomeada");
        assert_eq!(stored[0].member_count, 412);
    }

    #[tokio::test]
    async fn push_without_profile_fails() {
        let service = service(
            Arc::new(FakeBranchStore::default()),
            Arc::new(FakeProfileStore::default()),
        );
        assert!(service.push().await.is_err());
    }

    #[tokio::test]
    async fn pull_without_headquarters_fails() {
        let profiles = Arc::new(FakeProfileStore::default());
        profiles
            .save(sample_profile("Assembleia Central"))
            .await
            .unwrap_or_else(|_| panic!("test"));

        let service = service(Arc::new(FakeBranchStore::default()), profiles);
        assert!(service.pull().await.is_err());
    }

    #[tokio::test]
    async fn push_then_pull_round_trip_preserves_profile() {
        let branches = Arc::new(FakeBranchStore::default());
        let profiles = Arc::new(FakeProfileStore::default());
        let original = sample_profile("Assembleia Central");
        profiles
            .save(original.clone())
            .await
            .unwrap_or_else(|_| panic!("test"));

        let service = service(branches, profiles.clone());
        assert!(service.push().await.is_ok());
        assert!(service.pull().await.is_ok());

        let after = profiles.profile.lock().await.clone();
        assert_eq!(after, Some(original));
    }

    #[tokio::test]
    async fn pull_preserves_brand_colors() {
        let branches = Arc::new(FakeBranchStore::default());
        let profiles = Arc::new(FakeProfileStore::default());
        profiles
            .save(sample_profile("Assembleia Central"))
            .await
            .unwrap_or_else(|_| panic!("test"));

        let service = service(branches.clone(), profiles.clone());
        assert!(service.push().await.is_ok());

        // Rename the headquarters directly, then pull.
        {
            let mut stored = branches.branches.lock().await;
            stored[0].name =
                NonEmptyString::new("Sede Nacional").unwrap_or_else(|_| panic!("test"));
        }
        assert!(service.pull().await.is_ok());

        let after = profiles.profile.lock().await.clone();
        assert!(after.is_some());
        if let Some(profile) = after {
            assert_eq!(profile.name.as_str(), "Sede Nacional");
            assert_eq!(profile.brand.primary, "#0a0a0a");
            assert_eq!(profile.short_name, "ORG");
        }
    }

    #[tokio::test]
    async fn pull_builds_profile_when_none_exists() {
        let branches = Arc::new(FakeBranchStore::default());
        let profiles = Arc::new(FakeProfileStore::default());
        branches
            .upsert_branch(Branch {
                id: BranchId::new(),
                name: NonEmptyString::new("Sede").unwrap_or_else(|_| panic!("test")),
                address: Address::default(),
                leader_name: "Pr. Neves".to_owned(),
                tax_id: None,
                member_count: 10,
                status: BranchStatus::Active,
                is_headquarters: true,
                founded_at: Utc::now(),
            })
            .await
            .unwrap_or_else(|_| panic!("test"));

        let service = service(branches, profiles.clone());
        assert!(service.pull().await.is_ok());

        let after = profiles.profile.lock().await.clone();
        assert!(after.is_some());
    }
}
