//! Membership role reconciliation
//!
//! Matches guild members whose display name encodes a network
//! identity against the identities currently online on tracked
//! positions, and converges the managed role to that target state.

use crate::error::{EngineResult, GatewayError};
use crate::sources::{GuildGateway, MemberId};
use sector_types::Cid;
use std::collections::HashSet;

/// Extract a network identity from a member display name.
///
/// Two shapes are accepted:
///
/// 1. `"First Last - 123456"` — the text after the last `" - "`,
///    which must be entirely numeric
/// 2. `"|-123456-|"` — a bracketed, purely numeric identity
///
/// Anything else yields `None` and the member is skipped.
pub fn extract_cid(display_name: &str) -> Option<Cid> {
    let display_name = display_name.trim();
    if display_name.is_empty() {
        return None;
    }

    if display_name.contains(" - ") {
        let candidate = display_name.rsplit(" - ").next()?.trim();
        if !candidate.is_empty() && candidate.chars().all(|c| c.is_ascii_digit()) {
            return Some(Cid::from(candidate));
        }
    } else if display_name.contains("|-") && display_name.contains("-|") {
        let candidate = display_name.replace("|-", "").replace("-|", "");
        let candidate = candidate.trim();
        if !candidate.is_empty() && candidate.chars().all(|c| c.is_ascii_digit()) {
            return Some(Cid::from(candidate));
        }
    }

    None
}

/// What one reconciliation cycle changed.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// Roles granted this cycle
    pub granted: usize,
    /// Roles revoked this cycle
    pub revoked: usize,
    /// Mutations skipped because a permission failure was already
    /// reported for the member
    pub suppressed: usize,
}

/// Reconciles the managed role across guild members.
///
/// Role state is re-derived from scratch every cycle; the only state
/// carried between cycles is the permission-failure suppression set,
/// so a member stuck behind a role-hierarchy problem is reported once
/// rather than once a minute.
pub struct MembershipReconciler {
    muted: HashSet<MemberId>,
}

impl MembershipReconciler {
    /// New reconciler with an empty suppression set.
    pub fn new() -> Self {
        Self {
            muted: HashSet::new(),
        }
    }

    /// Converge every member's role to: holds role ⇔ parsed identity
    /// is in `online_cids`.
    ///
    /// Members without a display name, or whose name parses to no
    /// identity, are skipped. Members already in the target state are
    /// untouched (no mutation, no log noise).
    pub async fn reconcile(
        &mut self,
        gateway: &dyn GuildGateway,
        online_cids: &HashSet<Cid>,
    ) -> EngineResult<ReconcileOutcome> {
        let members = gateway.members().await?;
        let mut outcome = ReconcileOutcome::default();

        for member in members {
            let Some(display_name) = member.display_name.as_deref() else {
                continue;
            };
            let Some(cid) = extract_cid(display_name) else {
                continue;
            };

            let should_hold = online_cids.contains(&cid);
            if should_hold == member.has_role {
                continue;
            }

            let result = if should_hold {
                gateway.grant_role(&member.id).await
            } else {
                gateway.revoke_role(&member.id).await
            };

            match result {
                Ok(()) => {
                    if should_hold {
                        tracing::info!(
                            member = %member.id,
                            cid = %cid,
                            "Granted online-controller role"
                        );
                        outcome.granted += 1;
                    } else {
                        tracing::info!(
                            member = %member.id,
                            cid = %cid,
                            "Revoked online-controller role"
                        );
                        outcome.revoked += 1;
                    }
                    self.muted.remove(&member.id);
                }
                Err(GatewayError::PermissionDenied) => {
                    if self.muted.insert(member.id.clone()) {
                        tracing::error!(
                            member = %member.id,
                            "Permission denied mutating member roles"
                        );
                    } else {
                        outcome.suppressed += 1;
                    }
                }
                Err(err) => return Err(err.into()),
            }
        }

        Ok(outcome)
    }

    /// Whether a member's permission failures are currently muted.
    pub fn is_muted(&self, member: &MemberId) -> bool {
        self.muted.contains(member)
    }
}

impl Default for MembershipReconciler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::GuildMember;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[test]
    fn test_extract_cid_name_dash_shape() {
        assert_eq!(extract_cid("John Doe - 123456"), Some(Cid::from("123456")));
    }

    #[test]
    fn test_extract_cid_bracketed_shape() {
        assert_eq!(extract_cid("|-123456-|"), Some(Cid::from("123456")));
    }

    #[test]
    fn test_extract_cid_rejects_non_numeric() {
        assert_eq!(extract_cid("no id here"), None);
        assert_eq!(extract_cid("John Doe - abc123"), None);
        assert_eq!(extract_cid("|-abc-|"), None);
        assert_eq!(extract_cid(""), None);
        assert_eq!(extract_cid("Tail - "), None);
    }

    #[test]
    fn test_extract_cid_uses_last_separator() {
        assert_eq!(
            extract_cid("A - B - 654321"),
            Some(Cid::from("654321"))
        );
    }

    #[derive(Default)]
    struct FakeGuild {
        members: Vec<GuildMember>,
        deny: bool,
        grants: Mutex<Vec<MemberId>>,
        revokes: Mutex<Vec<MemberId>>,
    }

    #[async_trait]
    impl GuildGateway for FakeGuild {
        async fn members(&self) -> Result<Vec<GuildMember>, GatewayError> {
            Ok(self.members.clone())
        }

        async fn grant_role(&self, member: &MemberId) -> Result<(), GatewayError> {
            if self.deny {
                return Err(GatewayError::PermissionDenied);
            }
            self.grants.lock().unwrap().push(member.clone());
            Ok(())
        }

        async fn revoke_role(&self, member: &MemberId) -> Result<(), GatewayError> {
            if self.deny {
                return Err(GatewayError::PermissionDenied);
            }
            self.revokes.lock().unwrap().push(member.clone());
            Ok(())
        }
    }

    fn member(id: &str, nick: Option<&str>, has_role: bool) -> GuildMember {
        GuildMember {
            id: MemberId::new(id),
            display_name: nick.map(str::to_string),
            has_role,
        }
    }

    fn online(cids: &[u64]) -> HashSet<Cid> {
        cids.iter().map(|cid| Cid::from(*cid)).collect()
    }

    #[tokio::test]
    async fn test_converges_to_online_set() {
        let guild = FakeGuild {
            members: vec![
                member("1", Some("Alice - 111111"), false), // online, needs grant
                member("2", Some("Bob - 222222"), true),    // offline, needs revoke
                member("3", Some("Carol - 333333"), true),  // online, already correct
                member("4", Some("no id here"), false),     // unparseable, skipped
                member("5", None, true),                    // no nickname, skipped
            ],
            ..Default::default()
        };
        let mut reconciler = MembershipReconciler::new();

        let outcome = reconciler
            .reconcile(&guild, &online(&[111111, 333333]))
            .await
            .unwrap();

        assert_eq!(outcome.granted, 1);
        assert_eq!(outcome.revoked, 1);
        assert_eq!(*guild.grants.lock().unwrap(), vec![MemberId::new("1")]);
        assert_eq!(*guild.revokes.lock().unwrap(), vec![MemberId::new("2")]);
    }

    #[tokio::test]
    async fn test_idempotent_when_converged() {
        let guild = FakeGuild {
            members: vec![member("1", Some("Alice - 111111"), true)],
            ..Default::default()
        };
        let mut reconciler = MembershipReconciler::new();

        let outcome = reconciler.reconcile(&guild, &online(&[111111])).await.unwrap();

        assert_eq!(outcome, ReconcileOutcome::default());
        assert!(guild.grants.lock().unwrap().is_empty());
        assert!(guild.revokes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_permission_failures_reported_once() {
        let guild = FakeGuild {
            members: vec![member("1", Some("Alice - 111111"), false)],
            deny: true,
            ..Default::default()
        };
        let mut reconciler = MembershipReconciler::new();

        let first = reconciler.reconcile(&guild, &online(&[111111])).await.unwrap();
        assert_eq!(first.suppressed, 0);
        assert!(reconciler.is_muted(&MemberId::new("1")));

        let second = reconciler.reconcile(&guild, &online(&[111111])).await.unwrap();
        assert_eq!(second.suppressed, 1);
    }

    #[tokio::test]
    async fn test_successful_mutation_clears_suppression() {
        let mut guild = FakeGuild {
            members: vec![member("1", Some("Alice - 111111"), false)],
            deny: true,
            ..Default::default()
        };
        let mut reconciler = MembershipReconciler::new();

        reconciler.reconcile(&guild, &online(&[111111])).await.unwrap();
        assert!(reconciler.is_muted(&MemberId::new("1")));

        guild.deny = false;
        reconciler.reconcile(&guild, &online(&[111111])).await.unwrap();
        assert!(!reconciler.is_muted(&MemberId::new("1")));
    }
}
