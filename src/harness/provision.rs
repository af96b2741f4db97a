use super::Harness;
use crate::api::QuizApi;
use crate::metrics::Op;
use crate::model::{Actor, Registration, Role};


impl<A: QuizApi> Harness<A> {
/// Registers one identity. `None` when the service refused it; the failure
/// is already counted.
pub async fn register(&self, form: Registration) -> Option<Actor> {
let session = self.call(Op::Register, self.api.register(&form)).await?;
Some(Actor {
username: form.username,
email: form.email,
password: form.password,
token: session.token,
id: session.user_id,
role: session.role.unwrap_or_default(),
})
}


/// Registers every form on the pool. The returned population may be
/// smaller than the input; callers decide whether that is fatal.
pub async fn register_all(&self, forms: Vec<Registration>) -> Vec<Actor> {
let units = forms.into_iter().map(|form| {
let h = self.clone();
async move { h.register(form).await }
});
self.pool.run(units).await.into_iter().flatten().collect()
}


/// Logs the actor in again and swaps in the fresh token.
pub async fn login(&self, actor: &mut Actor) -> bool {
match self.call(Op::Login, self.api.login(&actor.username, &actor.password)).await {
Some(session) => {
actor.token = session.token;
if let Some(role) = session.role { actor.role = role; }
if actor.id.is_none() { actor.id = session.user_id; }
true
}
None => false,
}
}


/// Session for a pre-existing administrative account.
pub async fn admin_session(&self, email: &str, password: &str) -> Option<Actor> {
let session = self.call(Op::Login, self.api.login(email, password)).await?;
Some(Actor {
username: email.to_string(),
email: email.to_string(),
password: password.to_string(),
token: session.token,
id: session.user_id,
role: session.role.unwrap_or(Role::Admin),
})
}


/// Promotes one actor with its own token, then re-authenticates so the
/// token carries the new role claim.
pub async fn promote(&self, mut actor: Actor) -> (Actor, bool) {
let Some(id) = actor.id.clone() else {
tracing::warn!(user = %actor.username, "cannot promote actor without a user id");
return (actor, false);
};
if self.call(Op::Promote, self.api.promote(&actor.token, &id)).await.is_none() {
return (actor, false);
}
actor.role = Role::Admin;
if !self.login(&mut actor).await {
tracing::warn!(user = %actor.username, "promoted but re-login failed; token still carries the old role");
}
(actor, true)
}


/// Promotes the first `count` actors. Returns how many promotions succeeded.
pub async fn promote_first(&self, actors: &mut [Actor], count: usize) -> usize {
let count = count.min(actors.len());
let units = actors[..count].iter().cloned().enumerate().map(|(idx, actor)| {
let h = self.clone();
async move { (idx, h.promote(actor).await) }
});

let mut promoted = 0;
for (idx, (actor, ok)) in self.pool.run(units).await {
actors[idx] = actor;
promoted += usize::from(ok);
}
promoted
}
}
