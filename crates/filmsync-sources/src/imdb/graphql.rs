use crate::error::SourceError;
use crate::response::ActionResponse;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};

pub const RATE_TITLE_MUTATION: &str = "mutation UpdateTitleRating($rating: Int!, $titleId: ID!) { rateTitle(input: {rating: $rating, titleId: $titleId}) { rating { value __typename } __typename }}";

pub const ADD_TO_LIST_MUTATION: &str = "mutation AddConstToList($listId: ID!, $constId: ID!) { addItemToList(input: {listId: $listId, item: {itemElementId: $constId}}) { listId __typename }}";

pub const USER_LISTS_QUERY: &str = "query YourLists($first: Int!) { me { userLists(first: $first, filter: {listElementType: TITLES}) { edges { node { id name { originalText } } } } } }";

pub const CREATE_LIST_MUTATION: &str = "mutation CreateList($input: CreateListInput!) { createList(input: $input) { list { id } } }";

/// How many of the user's lists are scanned when looking one up by name
pub const USER_LISTS_PAGE_SIZE: u32 = 250;

pub fn rate_title_body(title_id: &str, rating: u8) -> Value {
    json!({
        "query": RATE_TITLE_MUTATION,
        "operationName": "UpdateTitleRating",
        "variables": {
            "rating": rating,
            "titleId": title_id
        }
    })
}

pub fn add_to_list_body(list_id: &str, title_id: &str) -> Value {
    json!({
        "query": ADD_TO_LIST_MUTATION,
        "operationName": "AddConstToList",
        "variables": {
            "listId": list_id,
            "constId": title_id
        }
    })
}

pub fn user_lists_body() -> Value {
    json!({
        "query": USER_LISTS_QUERY,
        "operationName": "YourLists",
        "variables": { "first": USER_LISTS_PAGE_SIZE }
    })
}

pub fn create_list_body(name: &str, description: &str) -> Value {
    json!({
        "query": CREATE_LIST_MUTATION,
        "operationName": "CreateList",
        "variables": {
            "input": {
                "name": name,
                "listDescription": description,
                "listType": "TITLES",
                "visibility": "PRIVATE"
            }
        }
    })
}

#[derive(Debug, Deserialize)]
pub struct GraphQlResponse {
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
pub struct GraphQlError {
    pub message: String,
    #[serde(default)]
    pub extensions: Option<Value>,
}

impl GraphQlError {
    fn is_authentication(&self) -> bool {
        self.message.contains("Authentication")
            || self.code() == Some("UNAUTHENTICATED")
    }

    fn is_rate_limit(&self) -> bool {
        let message = self.message.to_lowercase();
        message.contains("rate limit")
            || message.contains("too many requests")
            || self.code() == Some("TOO_MANY_REQUESTS")
    }

    fn code(&self) -> Option<&str> {
        self.extensions
            .as_ref()
            .and_then(|ext| ext.get("code"))
            .and_then(Value::as_str)
    }
}

/// Map the HTTP status alone. `None` means the status is a success and the
/// body still needs inspecting.
pub fn classify_status(status: StatusCode, context: &str) -> Option<ActionResponse> {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Some(ActionResponse::RateLimited);
    }
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Some(ActionResponse::AuthenticationFailure);
    }
    if !status.is_success() {
        return Some(ActionResponse::OtherFailure(format!(
            "Error {}. Code: {}",
            context,
            status.as_u16()
        )));
    }
    None
}

/// Map a GraphQL mutation response to the engine's view of it
pub fn classify_graphql(status: StatusCode, body: &str, context: &str) -> ActionResponse {
    if let Some(response) = classify_status(status, context) {
        return response;
    }

    let parsed: GraphQlResponse = match serde_json::from_str(body) {
        Ok(parsed) => parsed,
        Err(e) => {
            return ActionResponse::OtherFailure(format!("Malformed response {}: {}", context, e));
        }
    };

    match parsed.errors.first() {
        None => ActionResponse::Success,
        Some(error) if error.is_authentication() => ActionResponse::AuthenticationFailure,
        Some(error) if error.is_rate_limit() => ActionResponse::RateLimited,
        Some(error) => ActionResponse::OtherFailure(error.message.clone()),
    }
}

/// Watchlist writes are plain REST: the status is the whole answer
pub fn classify_rest(status: StatusCode, context: &str) -> ActionResponse {
    classify_status(status, context).unwrap_or(ActionResponse::Success)
}

/// Id of the user's list called exactly `name`, if there is one. `None`
/// means the list has to be created.
pub fn find_list_id<'a>(lists: &'a [(String, String)], name: &str) -> Option<&'a str> {
    lists
        .iter()
        .find(|(_, list_name)| list_name == name)
        .map(|(id, _)| id.as_str())
}

/// Id of the list returned by a `CreateList` mutation
pub fn created_list_id(data: &Value) -> Result<String, SourceError> {
    data.pointer("/createList/list/id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .ok_or_else(|| SourceError::Api {
            service: "IMDb",
            message: "created list has no id".to_string(),
        })
}

/// Pull `(id, name)` pairs out of a `YourLists` response
pub fn parse_user_lists(data: &Value) -> Vec<(String, String)> {
    data.pointer("/me/userLists/edges")
        .and_then(Value::as_array)
        .map(|edges| {
            edges
                .iter()
                .filter_map(|edge| {
                    let node = edge.get("node")?;
                    let id = node.get("id")?.as_str()?;
                    let name = node.pointer("/name/originalText")?.as_str()?;
                    Some((id.to_string(), name.to_string()))
                })
                .collect()
        })
        .unwrap_or_default()
}
