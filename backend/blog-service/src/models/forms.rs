/// Input forms accepted by the HTTP layer.
///
/// Each form validates itself with `validator` and then applies the checks the
/// derive cannot express (blank-after-trim, username alphabet). `clean()`
/// returns either normalized data or every field error at once.
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{GroupId, NewGroup, PostDraft};
use crate::error::{FieldErrors, Result};

const REQUIRED: &str = "This field is required.";

/// Description of one form field, served by the GET side of form endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub help_text: &'static str,
    pub kind: &'static str,
    pub required: bool,
}

fn collect<T: Validate>(form: &T) -> FieldErrors {
    match form.validate() {
        Ok(()) => FieldErrors::new(),
        Err(errors) => errors.into(),
    }
}

fn require_not_blank(fields: &mut FieldErrors, name: &str, value: &str) {
    if !fields.contains(name) && value.trim().is_empty() {
        fields.add(name, REQUIRED);
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct PostForm {
    #[serde(default)]
    #[validate(length(min = 1, message = "This field is required."))]
    pub text: String,
    #[serde(default)]
    pub group: Option<GroupId>,
    /// Media key of an uploaded image. Only set from a stored upload, never
    /// from a request body.
    #[serde(default, skip_deserializing)]
    #[validate(length(max = 255, message = "Image path is too long."))]
    pub image: Option<String>,
}

impl PostForm {
    pub fn fields() -> Vec<FieldSpec> {
        vec![
            FieldSpec {
                name: "text",
                label: "Text",
                help_text: "Enter the text of your new post",
                kind: "text",
                required: true,
            },
            FieldSpec {
                name: "group",
                label: "Group",
                help_text: "Choose a group for your new post",
                kind: "choice",
                required: false,
            },
            FieldSpec {
                name: "image",
                label: "Image",
                help_text: "Attach an image to your new post",
                kind: "image",
                required: false,
            },
        ]
    }

    /// Group existence is checked by the post service, not here.
    pub fn clean(&self) -> Result<PostDraft> {
        let mut fields = collect(self);
        require_not_blank(&mut fields, "text", &self.text);
        fields.into_result()?;

        Ok(PostDraft {
            text: self.text.trim().to_string(),
            group_id: self.group,
            image: non_empty(self.image.as_deref()),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct CommentForm {
    #[serde(default)]
    #[validate(length(min = 1, message = "This field is required."))]
    pub text: String,
}

impl CommentForm {
    pub fn fields() -> Vec<FieldSpec> {
        vec![FieldSpec {
            name: "text",
            label: "Comment",
            help_text: "Enter the text of your comment",
            kind: "text",
            required: true,
        }]
    }

    pub fn clean(&self) -> Result<String> {
        let mut fields = collect(self);
        require_not_blank(&mut fields, "text", &self.text);
        fields.into_result()?;
        Ok(self.text.trim().to_string())
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct SignupForm {
    #[serde(default)]
    #[validate(length(max = 150, message = "Ensure this value has at most 150 characters."))]
    pub first_name: String,
    #[serde(default)]
    #[validate(length(max = 150, message = "Ensure this value has at most 150 characters."))]
    pub last_name: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 150, message = "Username must be 1 to 150 characters."))]
    pub username: String,
    #[serde(default)]
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 8, message = "Password must contain at least 8 characters."))]
    pub password: String,
}

impl SignupForm {
    pub fn fields() -> Vec<FieldSpec> {
        vec![
            FieldSpec {
                name: "first_name",
                label: "First name",
                help_text: "",
                kind: "text",
                required: false,
            },
            FieldSpec {
                name: "last_name",
                label: "Last name",
                help_text: "",
                kind: "text",
                required: false,
            },
            FieldSpec {
                name: "username",
                label: "Username",
                help_text: "150 characters or fewer. Letters, digits and @/./+/-/_ only.",
                kind: "text",
                required: true,
            },
            FieldSpec {
                name: "email",
                label: "Email address",
                help_text: "",
                kind: "email",
                required: true,
            },
            FieldSpec {
                name: "password",
                label: "Password",
                help_text: "At least 8 characters.",
                kind: "password",
                required: true,
            },
        ]
    }

    pub fn clean(&self) -> Result<SignupForm> {
        let mut fields = collect(self);
        let username = self.username.trim();
        if !fields.contains("username") && !is_valid_username(username) {
            fields.add(
                "username",
                "Enter a valid username. Letters, digits and @/./+/-/_ only.",
            );
        }
        fields.into_result()?;

        Ok(SignupForm {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            username: username.to_string(),
            email: self.email.trim().to_string(),
            password: self.password.clone(),
        })
    }
}

pub fn is_valid_username(username: &str) -> bool {
    !username.is_empty()
        && username
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct LoginForm {
    #[serde(default)]
    #[validate(length(min = 1, message = "This field is required."))]
    pub username: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "This field is required."))]
    pub password: String,
}

impl LoginForm {
    pub fn fields() -> Vec<FieldSpec> {
        vec![
            FieldSpec {
                name: "username",
                label: "Username",
                help_text: "",
                kind: "text",
                required: true,
            },
            FieldSpec {
                name: "password",
                label: "Password",
                help_text: "",
                kind: "password",
                required: true,
            },
        ]
    }

    pub fn clean(&self) -> Result<(String, String)> {
        collect(self).into_result()?;
        Ok((self.username.trim().to_string(), self.password.clone()))
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct GroupForm {
    #[serde(default)]
    #[validate(length(min = 1, max = 200, message = "Title must be 1 to 200 characters."))]
    pub title: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 50, message = "Slug must be 1 to 50 characters."))]
    pub slug: String,
    #[serde(default)]
    pub description: String,
}

impl GroupForm {
    pub fn clean(&self) -> Result<NewGroup> {
        let mut fields = collect(self);
        let slug = self.slug.trim();
        if !fields.contains("slug")
            && !slug
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            fields.add("slug", "Enter a valid slug. Letters, digits, - and _ only.");
        }
        fields.into_result()?;

        Ok(NewGroup {
            title: self.title.trim().to_string(),
            slug: slug.to_string(),
            description: self.description.trim().to_string(),
        })
    }
}
