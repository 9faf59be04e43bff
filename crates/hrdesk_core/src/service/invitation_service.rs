//! Invitation use-case service.
//!
//! # Responsibility
//! - Issue invitations with random tokens and a configurable lifetime.
//! - Redeem a token into a verified employee account.
//!
//! # Invariants
//! - Tokens are 64 lowercase hex characters.
//! - A used or expired invitation never creates an account.

use crate::model::company::CompanyId;
use crate::model::invitation::{default_invitation_ttl, Invitation, NewInvitation};
use crate::model::now_millis;
use crate::model::user::{NewUser, User, UserId};
use crate::repo::invitation_repo::{InvitationListQuery, InvitationRepository};
use crate::service::{ServiceError, ServiceResult};
use chrono::TimeDelta;
use log::info;
use uuid::Uuid;

/// Use-case service for invitation issue/redeem flows.
pub struct InvitationService<R: InvitationRepository> {
    repo: R,
    ttl: TimeDelta,
}

impl<R: InvitationRepository> InvitationService<R> {
    /// Creates a service issuing invitations valid for the default lifetime.
    pub fn new(repo: R) -> Self {
        Self::with_ttl(repo, default_invitation_ttl())
    }

    pub fn with_ttl(repo: R, ttl: TimeDelta) -> Self {
        Self { repo, ttl }
    }

    /// Issues a new invitation on behalf of an `hr` user.
    pub fn issue(
        &self,
        company_id: CompanyId,
        invited_email: impl Into<String>,
        invited_by: UserId,
    ) -> ServiceResult<Invitation> {
        let new = NewInvitation::new(company_id, invited_email, invited_by, generate_token());
        let invitation = self.repo.create_invitation(new, self.ttl)?;
        info!(
            "event=invitation_issue module=service status=ok invitation_id={} company_id={}",
            invitation.id, invitation.company_id
        );
        Ok(invitation)
    }

    /// Redeems `token`, creating the invited account from `signup`.
    ///
    /// # Contract
    /// - Unknown token: `InvitationNotFound`.
    /// - Already used: `InvitationUsed`.
    /// - Past `expires_at`: `InvitationExpired`.
    /// - Company, role, verification and inviter of `signup` are overridden
    ///   from the invitation.
    pub fn redeem(&self, token: &str, signup: NewUser) -> ServiceResult<(Invitation, User)> {
        let invitation = self
            .repo
            .find_invitation_by_token(token)?
            .ok_or(ServiceError::InvitationNotFound)?;
        let now = now_millis();
        if invitation.is_used {
            return Err(ServiceError::InvitationUsed(invitation.id));
        }
        if invitation.is_expired_at(now) {
            return Err(ServiceError::InvitationExpired {
                id: invitation.id,
                expires_at: invitation.expires_at,
            });
        }

        let (invitation, user) = self.repo.redeem_invitation(invitation.id, signup, now)?;
        info!(
            "event=invitation_redeem module=service status=ok invitation_id={} user_id={}",
            invitation.id, user.id
        );
        Ok((invitation, user))
    }

    /// Lists invitations of one company that can still be redeemed.
    pub fn list_pending(&self, company_id: CompanyId) -> ServiceResult<Vec<Invitation>> {
        let now = now_millis();
        let invitations = self.repo.list_invitations(&InvitationListQuery {
            company_id: Some(company_id),
            is_used: Some(false),
            ..InvitationListQuery::default()
        })?;
        Ok(invitations
            .into_iter()
            .filter(|invitation| invitation.is_redeemable_at(now))
            .collect())
    }
}

/// Returns a fresh 64-char lowercase hex token.
pub fn generate_token() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}
