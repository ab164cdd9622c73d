//! In-memory repository implementations.
//!
//! `MemoryStore` implements every repository trait over plain collections
//! with the same ownership, ordering, and tag semantics as the PostgreSQL
//! repositories. It backs the API test-suite and local experiments that do
//! not need a database.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use notekeep_core::defaults::SESSION_TOKEN_LEN;
use notekeep_core::{
    new_v7, normalize_tag_name, Error, IdentityUser, Note, NoteDraft, NoteRepository,
    RequestContext, Result, SessionRepository, TagRepository, TagWithCount, User, UserRepository,
};

use crate::sessions::{generate_secret, hash_secret};

#[derive(Debug, Clone)]
struct StoredNote {
    id: Uuid,
    owner_id: String,
    title: String,
    text: String,
    archived: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    tag_ids: Vec<Uuid>,
}

#[derive(Debug, Clone)]
struct StoredTag {
    id: Uuid,
    owner_id: String,
    name: String,
}

#[derive(Debug, Default)]
struct State {
    users: HashMap<String, User>,
    notes: HashMap<Uuid, StoredNote>,
    tags: Vec<StoredTag>,
    sessions: HashMap<String, (String, DateTime<Utc>)>,
    login_states: HashMap<String, (String, DateTime<Utc>)>,
    last_write: Option<DateTime<Utc>>,
}

impl State {
    /// Strictly increasing write timestamp, so update order is observable
    /// even when writes land within the same clock tick.
    fn tick(&mut self) -> DateTime<Utc> {
        let mut now = Utc::now();
        if let Some(last) = self.last_write {
            if now <= last {
                now = last + Duration::microseconds(1);
            }
        }
        self.last_write = Some(now);
        now
    }

    fn upsert_tags(&mut self, owner_id: &str, names: &[String]) -> Vec<Uuid> {
        names
            .iter()
            .map(|name| {
                match self
                    .tags
                    .iter()
                    .find(|t| t.owner_id == owner_id && &t.name == name)
                {
                    Some(tag) => tag.id,
                    None => {
                        let id = new_v7();
                        self.tags.push(StoredTag {
                            id,
                            owner_id: owner_id.to_string(),
                            name: name.clone(),
                        });
                        id
                    }
                }
            })
            .collect()
    }

    fn tag_names(&self, tag_ids: &[Uuid]) -> Vec<String> {
        let mut names: Vec<String> = self
            .tags
            .iter()
            .filter(|t| tag_ids.contains(&t.id))
            .map(|t| t.name.clone())
            .collect();
        names.sort();
        names
    }

    fn to_note(&self, stored: &StoredNote) -> Note {
        Note {
            id: stored.id,
            owner_id: stored.owner_id.clone(),
            title: stored.title.clone(),
            text: stored.text.clone(),
            archived: stored.archived,
            created_at: stored.created_at,
            updated_at: stored.updated_at,
            tags: self.tag_names(&stored.tag_ids),
        }
    }

    fn owned_mut(&mut self, ctx: &RequestContext, id: Uuid) -> Result<&mut StoredNote> {
        self.notes
            .get_mut(&id)
            .filter(|n| n.owner_id == ctx.user_id())
            .ok_or(Error::NotFoundOrForbidden(id))
    }

    /// Notes owned by `ctx` with the given archived flag, newest update first.
    fn visible(&self, ctx: &RequestContext, archived: bool) -> Vec<Note> {
        let mut notes: Vec<Note> = self
            .notes
            .values()
            .filter(|n| n.owner_id == ctx.user_id() && n.archived == archived)
            .map(|n| self.to_note(n))
            .collect();
        notes.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(b.id.cmp(&a.id)));
        notes
    }
}

/// Repositories backed by process memory.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| Error::Internal("memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl NoteRepository for MemoryStore {
    async fn create(&self, ctx: &RequestContext, draft: NoteDraft) -> Result<Note> {
        draft.validate()?;
        let mut state = self.state()?;
        let now = state.tick();
        let tag_ids = state.upsert_tags(ctx.user_id(), &draft.tag_names());
        let stored = StoredNote {
            id: new_v7(),
            owner_id: ctx.user_id().to_string(),
            title: draft.title,
            text: draft.text,
            archived: false,
            created_at: now,
            updated_at: now,
            tag_ids,
        };
        let note = state.to_note(&stored);
        state.notes.insert(stored.id, stored);
        Ok(note)
    }

    async fn update(&self, ctx: &RequestContext, id: Uuid, draft: NoteDraft) -> Result<Note> {
        let mut state = self.state()?;
        state.owned_mut(ctx, id)?;
        draft.validate()?;

        let now = state.tick();
        let tag_ids = state.upsert_tags(ctx.user_id(), &draft.tag_names());
        let stored = state.owned_mut(ctx, id)?;
        stored.title = draft.title;
        stored.text = draft.text;
        stored.updated_at = now;
        stored.tag_ids = tag_ids;

        let stored = stored.clone();
        Ok(state.to_note(&stored))
    }

    async fn delete(&self, ctx: &RequestContext, id: Uuid) -> Result<()> {
        let mut state = self.state()?;
        state.owned_mut(ctx, id)?;
        state.notes.remove(&id);
        Ok(())
    }

    async fn set_archived(&self, ctx: &RequestContext, id: Uuid, archived: bool) -> Result<()> {
        let mut state = self.state()?;
        state.owned_mut(ctx, id)?.archived = archived;
        Ok(())
    }

    async fn fetch(&self, ctx: &RequestContext, id: Uuid) -> Result<Note> {
        let state = self.state()?;
        state
            .notes
            .get(&id)
            .filter(|n| n.owner_id == ctx.user_id())
            .map(|n| state.to_note(n))
            .ok_or(Error::NotFoundOrForbidden(id))
    }

    async fn list(
        &self,
        ctx: &RequestContext,
        archived: bool,
        tag: Option<&str>,
    ) -> Result<Vec<Note>> {
        let state = self.state()?;
        let notes = state.visible(ctx, archived);
        match tag.map(normalize_tag_name) {
            // A blank name matches no tag.
            Some(name) if name.is_empty() => Ok(Vec::new()),
            Some(name) => Ok(notes.into_iter().filter(|n| n.tags.contains(&name)).collect()),
            None => Ok(notes),
        }
    }

    async fn search(
        &self,
        ctx: &RequestContext,
        query: &str,
        archived: bool,
    ) -> Result<Vec<Note>> {
        let needle = query.trim().to_lowercase();
        let state = self.state()?;
        let notes = state.visible(ctx, archived);
        if needle.is_empty() {
            return Ok(notes);
        }
        Ok(notes
            .into_iter()
            .filter(|n| {
                n.title.to_lowercase().contains(&needle)
                    || n.text.to_lowercase().contains(&needle)
                    || n.tags.iter().any(|t| t.contains(&needle))
            })
            .collect())
    }
}

#[async_trait]
impl TagRepository for MemoryStore {
    async fn list_with_counts(&self, ctx: &RequestContext) -> Result<Vec<TagWithCount>> {
        let state = self.state()?;
        let mut tags: Vec<TagWithCount> = state
            .tags
            .iter()
            .filter(|t| t.owner_id == ctx.user_id())
            .map(|t| TagWithCount {
                id: t.id,
                name: t.name.clone(),
                note_count: state
                    .notes
                    .values()
                    .filter(|n| !n.archived && n.tag_ids.contains(&t.id))
                    .count() as i64,
            })
            .collect();
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tags)
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn upsert(&self, identity: &IdentityUser) -> Result<User> {
        let mut state = self.state()?;
        let now = Utc::now();
        let user = state
            .users
            .entry(identity.id.clone())
            .and_modify(|u| {
                u.email = identity.email.clone();
                u.updated_at = now;
            })
            .or_insert_with(|| User {
                id: identity.id.clone(),
                email: identity.email.clone(),
                created_at: now,
                updated_at: now,
            });
        Ok(user.clone())
    }

    async fn get(&self, id: &str) -> Result<Option<User>> {
        Ok(self.state()?.users.get(id).cloned())
    }
}

#[async_trait]
impl SessionRepository for MemoryStore {
    async fn create(&self, user_id: &str, ttl: Duration) -> Result<String> {
        let token = generate_secret(SESSION_TOKEN_LEN);
        self.state()?
            .sessions
            .insert(hash_secret(&token), (user_id.to_string(), Utc::now() + ttl));
        Ok(token)
    }

    async fn resolve(&self, token: &str) -> Result<Option<String>> {
        let state = self.state()?;
        Ok(state
            .sessions
            .get(&hash_secret(token))
            .filter(|(_, expires_at)| *expires_at > Utc::now())
            .map(|(user_id, _)| user_id.clone()))
    }

    async fn revoke(&self, token: &str) -> Result<()> {
        self.state()?.sessions.remove(&hash_secret(token));
        Ok(())
    }

    async fn create_login_state(
        &self,
        state: &str,
        pkce_verifier: &str,
        ttl: Duration,
    ) -> Result<()> {
        self.state()?.login_states.insert(
            state.to_string(),
            (pkce_verifier.to_string(), Utc::now() + ttl),
        );
        Ok(())
    }

    async fn consume_login_state(&self, state: &str) -> Result<Option<String>> {
        let entry = self.state()?.login_states.remove(state);
        Ok(entry
            .filter(|(_, expires_at)| *expires_at > Utc::now())
            .map(|(verifier, _)| verifier))
    }
}
