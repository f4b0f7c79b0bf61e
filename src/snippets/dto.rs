use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppResult;
use crate::users::dto::PublicUser;
use crate::validation::{filled, require, Fields, Presence, RequiredFields, Rule};

pub(crate) const USER_ID: Rule = Rule {
    key: "userId",
    label: "User Id",
};
pub(crate) const SNIPPET_ID: Rule = Rule {
    key: "snippetId",
    label: "Snippet Id",
};
pub(crate) const CATEGORY: Rule = Rule {
    key: "category",
    label: "Category",
};
pub(crate) const ORDER: Rule = Rule {
    key: "order",
    label: "Order",
};
pub(crate) const TEXT: Rule = Rule {
    key: "text",
    label: "Text",
};

pub(crate) const ADD_SNIPPET: RequiredFields =
    RequiredFields::new(&[USER_ID, CATEGORY, ORDER, TEXT]);

/// Top level of an update body; the nested `snippet` object is checked separately.
pub(crate) const UPDATE_SNIPPET: RequiredFields = RequiredFields::new(&[USER_ID]);
pub(crate) const UPDATE_SNIPPET_TARGET: RequiredFields = RequiredFields::new(&[SNIPPET_ID]);
/// Fields that may be omitted from an update but never blanked.
pub(crate) const SNIPPET_FIELDS: RequiredFields = RequiredFields::new(&[CATEGORY, ORDER, TEXT]);

pub(crate) const DELETE_SNIPPET: RequiredFields = RequiredFields::new(&[USER_ID, SNIPPET_ID]);

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddSnippetRequest {
    pub user_id: Option<Uuid>,
    pub category: Option<String>,
    pub order: Option<i64>,
    pub text: Option<String>,
}

impl Fields for AddSnippetRequest {
    fn presence(&self, key: &str) -> Presence {
        match key {
            "userId" => Presence::of(&self.user_id),
            "category" => Presence::of_text(&self.category),
            "order" => Presence::of(&self.order),
            "text" => Presence::of_text(&self.text),
            _ => Presence::Absent,
        }
    }
}

impl AddSnippetRequest {
    /// Owner id and trimmed snippet content; every field is required.
    pub fn validate(self) -> AppResult<(Uuid, NewSnippet)> {
        ADD_SNIPPET.check(&self)?;
        let owner = require(self.user_id, USER_ID)?;
        let snippet = NewSnippet {
            category: require(filled(self.category), CATEGORY)?,
            order: require(self.order, ORDER)?,
            text: require(filled(self.text), TEXT)?,
        };
        Ok((owner, snippet))
    }
}

/// Snippet part of an update body, nested under `snippet` or inlined.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnippetFields {
    pub snippet_id: Option<Uuid>,
    pub category: Option<String>,
    pub order: Option<i64>,
    pub text: Option<String>,
}

impl Fields for SnippetFields {
    fn presence(&self, key: &str) -> Presence {
        match key {
            "snippetId" => Presence::of(&self.snippet_id),
            "category" => Presence::of_text(&self.category),
            "order" => Presence::of(&self.order),
            "text" => Presence::of_text(&self.text),
            _ => Presence::Absent,
        }
    }
}

/// Accepts `{userId, snippet: {snippetId, ...}}` and the flat `{userId, snippetId, ...}`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSnippetRequest {
    pub user_id: Option<Uuid>,
    pub snippet: Option<SnippetFields>,
    #[serde(flatten)]
    pub inline: SnippetFields,
}

impl Fields for UpdateSnippetRequest {
    fn presence(&self, key: &str) -> Presence {
        match key {
            "userId" => Presence::of(&self.user_id),
            _ => Presence::Absent,
        }
    }
}

impl UpdateSnippetRequest {
    pub fn validate(self) -> AppResult<(SnippetTarget, SnippetPatch)> {
        UPDATE_SNIPPET.check(&self)?;
        let user_id = require(self.user_id, USER_ID)?;
        let fields = self.snippet.unwrap_or(self.inline);
        UPDATE_SNIPPET_TARGET.check(&fields)?;
        SNIPPET_FIELDS.check_supplied(&fields)?;

        let target = SnippetTarget {
            user_id,
            snippet_id: require(fields.snippet_id, SNIPPET_ID)?,
        };
        let patch = SnippetPatch {
            category: filled(fields.category),
            order: fields.order,
            text: filled(fields.text),
        };
        Ok((target, patch))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteSnippetRequest {
    pub user_id: Option<Uuid>,
    pub snippet_id: Option<Uuid>,
}

impl Fields for DeleteSnippetRequest {
    fn presence(&self, key: &str) -> Presence {
        match key {
            "userId" => Presence::of(&self.user_id),
            "snippetId" => Presence::of(&self.snippet_id),
            _ => Presence::Absent,
        }
    }
}

impl DeleteSnippetRequest {
    pub fn validate(self) -> AppResult<SnippetTarget> {
        DELETE_SNIPPET.check(&self)?;
        Ok(SnippetTarget {
            user_id: require(self.user_id, USER_ID)?,
            snippet_id: require(self.snippet_id, SNIPPET_ID)?,
        })
    }
}

/// Validated add-snippet input.
#[derive(Debug, Clone)]
pub struct NewSnippet {
    pub category: String,
    pub order: i64,
    pub text: String,
}

/// Validated update input; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct SnippetPatch {
    pub category: Option<String>,
    pub order: Option<i64>,
    pub text: Option<String>,
}

/// Body form of the owner lookup.
#[derive(Debug, Deserialize)]
pub struct OwnerRequest {
    #[serde(rename = "_id")]
    pub id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllSnippetsResponse {
    pub total_snippets: usize,
    pub users_with_snippets: Vec<PublicUser>,
}

#[derive(Debug, Clone, Copy)]
pub struct SnippetTarget {
    pub user_id: Uuid,
    pub snippet_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use serde_json::json;

    #[test]
    fn add_request_enumerates_blank_fields() {
        let req: AddSnippetRequest = serde_json::from_value(json!({
            "userId": Uuid::new_v4(),
            "category": "",
            "order": 1,
            "text": "  "
        }))
        .unwrap();
        let msg = req.validate().unwrap_err().to_string();
        assert!(msg.contains("Category") && msg.contains("Text"), "{msg}");
        assert!(!msg.contains("Order"), "{msg}");
    }

    #[test]
    fn add_request_trims_content() {
        let owner = Uuid::new_v4();
        let req: AddSnippetRequest = serde_json::from_value(json!({
            "userId": owner,
            "category": " greeting ",
            "order": 2,
            "text": "hi "
        }))
        .unwrap();
        let (parsed_owner, new) = req.validate().unwrap();
        assert_eq!(parsed_owner, owner);
        assert_eq!(new.category, "greeting");
        assert_eq!(new.text, "hi");
        assert_eq!(new.order, 2);
    }

    #[test]
    fn malformed_id_does_not_deserialize() {
        let err = serde_json::from_value::<AddSnippetRequest>(json!({ "userId": "42" }))
            .unwrap_err()
            .to_string();
        assert!(!err.is_empty());
    }

    #[test]
    fn update_request_accepts_nested_and_inline() {
        let user_id = Uuid::new_v4();
        let snippet_id = Uuid::new_v4();

        let nested: UpdateSnippetRequest = serde_json::from_value(json!({
            "userId": user_id,
            "snippet": { "snippetId": snippet_id, "text": " hello " }
        }))
        .unwrap();
        let (target, patch) = nested.validate().unwrap();
        assert_eq!(target.user_id, user_id);
        assert_eq!(target.snippet_id, snippet_id);
        assert_eq!(patch.text.as_deref(), Some("hello"));
        assert!(patch.category.is_none() && patch.order.is_none());

        let inline: UpdateSnippetRequest = serde_json::from_value(json!({
            "userId": user_id,
            "snippetId": snippet_id,
            "order": 3
        }))
        .unwrap();
        let (target, patch) = inline.validate().unwrap();
        assert_eq!(target.snippet_id, snippet_id);
        assert_eq!(patch.order, Some(3));
    }

    #[test]
    fn update_request_rejects_blanked_fields() {
        let req: UpdateSnippetRequest = serde_json::from_value(json!({
            "userId": Uuid::new_v4(),
            "snippet": { "snippetId": Uuid::new_v4(), "category": " " }
        }))
        .unwrap();
        let err = req.validate().unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
        assert!(err.to_string().contains("Category"));

        let req: UpdateSnippetRequest =
            serde_json::from_value(json!({ "snippet": { "snippetId": Uuid::new_v4() } })).unwrap();
        assert!(req.validate().unwrap_err().to_string().contains("User Id"));
    }

    #[test]
    fn delete_request_lists_both_ids() {
        let msg = DeleteSnippetRequest::default()
            .validate()
            .unwrap_err()
            .to_string();
        assert!(msg.contains("User Id") && msg.contains("Snippet Id"), "{msg}");
    }
}
