use std::collections::HashSet;
use std::str::FromStr;

use common::AchievementStatus;
use uuid::Uuid;

use crate::error::AppError;

/// Role of an authenticated user. Exactly one per account.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UserRole {
    Student,
    Advisor,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Advisor => "advisor",
            Self::Admin => "admin",
        }
    }
}

impl FromStr for UserRole {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Self::Student),
            "advisor" => Ok(Self::Advisor),
            "admin" => Ok(Self::Admin),
            _ => Err(()),
        }
    }
}

/// A fully resolved request actor: token identity plus the profile ids and
/// advisee set the ownership predicates need. Built once per request by the
/// role resolver; the kernel itself never touches a store.
#[derive(Clone, Debug)]
pub struct Actor {
    pub user_id: i32,
    pub role: UserRole,
    pub permissions: Vec<String>,
    pub student_profile_id: Option<Uuid>,
    pub advisor_profile_id: Option<Uuid>,
    /// Student profile ids this actor advises; empty without an advisor
    /// profile.
    pub advisees: HashSet<Uuid>,
}

impl Actor {
    /// Admins hold every permission implicitly.
    pub fn has_permission(&self, permission: &str) -> bool {
        self.role == UserRole::Admin || self.permissions.iter().any(|p| p == permission)
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// The *self* predicate: the target belongs to the actor's own student
    /// profile.
    fn owns(&self, student_id: Uuid) -> bool {
        self.student_profile_id == Some(student_id)
    }

    /// The *advises* predicate: the target's student is in the actor's
    /// advisee set.
    fn advises(&self, student_id: Uuid) -> bool {
        self.advisees.contains(&student_id)
    }
}

/// Operations the kernel gates. Each maps to one required permission.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Create,
    Read,
    List,
    UpdateDetail,
    UploadAttachment,
    Submit,
    Delete,
    Verify,
    Reject,
    UpdateAdvisor,
    ViewStats,
    ManageUsers,
    ViewAlerts,
}

impl Action {
    pub fn required_permission(&self) -> &'static str {
        match self {
            Self::Create => "achievement:create",
            Self::Read | Self::List => "achievement:read",
            Self::UpdateDetail | Self::UploadAttachment => "achievement:update",
            Self::Submit => "achievement:submit",
            Self::Delete => "achievement:delete",
            Self::Verify | Self::Reject => "achievement:verify",
            Self::UpdateAdvisor => "advisor:update",
            Self::ViewStats => "stats:read",
            Self::ManageUsers => "user:manage",
            Self::ViewAlerts => "alert:read",
        }
    }
}

/// The achievement a decision is about: owner and current workflow status.
#[derive(Clone, Copy, Debug)]
pub struct Target {
    pub student_id: Uuid,
    pub status: AchievementStatus,
}

impl Target {
    pub fn new(student_id: Uuid, status: AchievementStatus) -> Self {
        Self { student_id, status }
    }
}

/// Two-phase authorization decision.
///
/// Phase 1 checks the permission table; phase 2 evaluates the ownership
/// predicate for the action when a target is present. Admins short-circuit
/// both phases. For a student who incidentally also holds an advisor
/// profile, ownership is evaluated before the advises predicate.
///
/// Status guards for update/upload/delete sit here and deny with
/// `forbidden`; submit/verify/reject check ownership only — their status
/// precondition belongs to the state machine and fails as `invalid-state`
/// downstream.
pub fn authorize(actor: &Actor, action: Action, target: Option<&Target>) -> Result<(), AppError> {
    if actor.is_admin() {
        return Ok(());
    }

    if !actor.has_permission(action.required_permission()) {
        return Err(AppError::PermissionDenied);
    }

    let Some(target) = target else {
        return Ok(());
    };

    let allowed = match action {
        Action::Create => actor.role == UserRole::Student && actor.owns(target.student_id),
        Action::Read | Action::List => {
            actor.owns(target.student_id) || actor.advises(target.student_id)
        }
        Action::UpdateDetail | Action::UploadAttachment | Action::Delete => {
            actor.owns(target.student_id) && target.status == AchievementStatus::Draft
        }
        Action::Submit => actor.owns(target.student_id),
        Action::Verify | Action::Reject => actor.advises(target.student_id),
        // Admin-only operations never reach here with a target; the
        // permission phase already denied every non-admin.
        Action::UpdateAdvisor | Action::ViewStats | Action::ManageUsers | Action::ViewAlerts => {
            false
        }
    };

    if allowed {
        Ok(())
    } else {
        Err(AppError::PermissionDenied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student(profile: Uuid) -> Actor {
        Actor {
            user_id: 1,
            role: UserRole::Student,
            permissions: vec![
                "achievement:create".into(),
                "achievement:read".into(),
                "achievement:update".into(),
                "achievement:submit".into(),
                "achievement:delete".into(),
            ],
            student_profile_id: Some(profile),
            advisor_profile_id: None,
            advisees: HashSet::new(),
        }
    }

    fn advisor(profile: Uuid, advisees: &[Uuid]) -> Actor {
        Actor {
            user_id: 2,
            role: UserRole::Advisor,
            permissions: vec![
                "achievement:read".into(),
                "achievement:verify".into(),
                "stats:read".into(),
            ],
            student_profile_id: None,
            advisor_profile_id: Some(profile),
            advisees: advisees.iter().copied().collect(),
        }
    }

    fn admin() -> Actor {
        Actor {
            user_id: 3,
            role: UserRole::Admin,
            permissions: vec![],
            student_profile_id: None,
            advisor_profile_id: None,
            advisees: HashSet::new(),
        }
    }

    #[test]
    fn test_missing_permission_denies_before_ownership() {
        let sid = Uuid::new_v4();
        let actor = student(sid);
        let target = Target::new(sid, AchievementStatus::Submitted);
        // Student role carries no verify permission, even over self.
        assert!(authorize(&actor, Action::Verify, Some(&target)).is_err());
    }

    #[test]
    fn test_admin_short_circuits_everything() {
        let target = Target::new(Uuid::new_v4(), AchievementStatus::Verified);
        for action in [
            Action::Create,
            Action::Read,
            Action::Delete,
            Action::Verify,
            Action::UpdateAdvisor,
            Action::ManageUsers,
        ] {
            assert!(authorize(&admin(), action, Some(&target)).is_ok());
        }
    }

    #[test]
    fn test_student_can_only_create_for_self() {
        let sid = Uuid::new_v4();
        let actor = student(sid);

        let own = Target::new(sid, AchievementStatus::Draft);
        assert!(authorize(&actor, Action::Create, Some(&own)).is_ok());

        let other = Target::new(Uuid::new_v4(), AchievementStatus::Draft);
        assert!(authorize(&actor, Action::Create, Some(&other)).is_err());
    }

    #[test]
    fn test_read_allows_owner_and_advisor() {
        let sid = Uuid::new_v4();
        let owner = student(sid);
        let their_advisor = advisor(Uuid::new_v4(), &[sid]);
        let other_advisor = advisor(Uuid::new_v4(), &[]);
        let target = Target::new(sid, AchievementStatus::Submitted);

        assert!(authorize(&owner, Action::Read, Some(&target)).is_ok());
        assert!(authorize(&their_advisor, Action::Read, Some(&target)).is_ok());
        assert!(authorize(&other_advisor, Action::Read, Some(&target)).is_err());
    }

    #[test]
    fn test_update_and_delete_are_draft_guarded() {
        let sid = Uuid::new_v4();
        let actor = student(sid);

        let draft = Target::new(sid, AchievementStatus::Draft);
        let submitted = Target::new(sid, AchievementStatus::Submitted);

        for action in [Action::UpdateDetail, Action::UploadAttachment, Action::Delete] {
            assert!(authorize(&actor, action, Some(&draft)).is_ok());
            // Status guard denies with forbidden once the record left draft.
            assert!(authorize(&actor, action, Some(&submitted)).is_err());
        }
    }

    #[test]
    fn test_submit_checks_ownership_only() {
        let sid = Uuid::new_v4();
        let actor = student(sid);
        // Submit over a submitted record passes the kernel; the state
        // machine turns it into invalid-state instead of forbidden.
        let submitted = Target::new(sid, AchievementStatus::Submitted);
        assert!(authorize(&actor, Action::Submit, Some(&submitted)).is_ok());

        let foreign = Target::new(Uuid::new_v4(), AchievementStatus::Draft);
        assert!(authorize(&actor, Action::Submit, Some(&foreign)).is_err());
    }

    #[test]
    fn test_verify_requires_the_advises_predicate() {
        let sid = Uuid::new_v4();
        let their_advisor = advisor(Uuid::new_v4(), &[sid]);
        let other_advisor = advisor(Uuid::new_v4(), &[Uuid::new_v4()]);
        let target = Target::new(sid, AchievementStatus::Submitted);

        assert!(authorize(&their_advisor, Action::Verify, Some(&target)).is_ok());
        assert!(authorize(&other_advisor, Action::Verify, Some(&target)).is_err());
        assert!(authorize(&other_advisor, Action::Reject, Some(&target)).is_err());
    }

    #[test]
    fn test_ownership_wins_before_advises_for_dual_profile_actors() {
        // A student who incidentally advises others still edits their own
        // drafts through the self predicate.
        let sid = Uuid::new_v4();
        let mut actor = student(sid);
        actor.advisor_profile_id = Some(Uuid::new_v4());
        actor.advisees = [Uuid::new_v4()].into_iter().collect();

        let own_draft = Target::new(sid, AchievementStatus::Draft);
        assert!(authorize(&actor, Action::UpdateDetail, Some(&own_draft)).is_ok());
        assert!(authorize(&actor, Action::Read, Some(&own_draft)).is_ok());
    }

    #[test]
    fn test_non_admin_never_updates_advisor_mappings() {
        let sid = Uuid::new_v4();
        assert!(authorize(&student(sid), Action::UpdateAdvisor, None).is_err());
        assert!(authorize(&advisor(Uuid::new_v4(), &[sid]), Action::UpdateAdvisor, None).is_err());
        assert!(authorize(&admin(), Action::UpdateAdvisor, None).is_ok());
    }
}
