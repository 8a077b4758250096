use std::collections::BTreeMap;

use crate::{post::PostId, view::ViewState, PostboardError, PostboardResult};

/// Actions every rendered post exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostAction {
    Update,
    Delete,
}

/// Per-post action bindings of the current view, keyed by post ID.
///
/// Rebuilt from scratch on every render; a binding from an earlier
/// render never survives a refresh.
#[derive(Debug, Default, Clone)]
pub struct HandlerRegistry {
    bindings: BTreeMap<PostId, Vec<PostAction>>,
}

impl HandlerRegistry {
    pub fn from_view(view: &ViewState) -> Self {
        let mut registry = Self::default();
        for block in view.blocks() {
            registry.register(block.id, PostAction::Update);
            registry.register(block.id, PostAction::Delete);
        }
        registry
    }

    pub fn register(&mut self, id: PostId, action: PostAction) {
        let actions = self.bindings.entry(id).or_default();
        if !actions.contains(&action) {
            actions.push(action);
        }
    }

    /// Look up the binding for `action` on post `id`.
    pub fn resolve(&self, id: PostId, action: PostAction) -> PostboardResult<PostId> {
        match self.bindings.get(&id) {
            Some(actions) if actions.contains(&action) => Ok(id),
            _ => Err(PostboardError::UnknownPost { id: id.get() }.into()),
        }
    }

    pub fn actions(&self, id: PostId) -> &[PostAction] {
        self.bindings.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::post::Post;

    #[test]
    fn registers_both_actions_per_block() {
        let posts = vec![
            Post::new(PostId::new(1), "A".into(), "x".into()),
            Post::new(PostId::new(5), "B".into(), "y".into()),
        ];
        let registry = HandlerRegistry::from_view(&ViewState::from_posts(&posts));

        assert_eq!(registry.len(), 2);
        assert_eq!(
            registry.actions(PostId::new(5)),
            &[PostAction::Update, PostAction::Delete]
        );
        assert_eq!(
            registry.resolve(PostId::new(1), PostAction::Delete).unwrap(),
            PostId::new(1)
        );
    }

    #[test]
    fn unknown_ids_do_not_resolve() {
        let registry = HandlerRegistry::from_view(&ViewState::LoadFailed);
        assert!(registry.is_empty());

        let err = registry
            .resolve(PostId::new(2), PostAction::Update)
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PostboardError>(),
            Some(PostboardError::UnknownPost { id: 2 })
        ));
    }
}
