use page_chat_model::{
    Answer, AnswerRequest, Suggestions, SuggestionsRequest,
};
use serde::{Deserialize, Serialize};

// ------------------------
// Types sent to the server
// ------------------------

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct ChatRequest<'a> {
    context: &'a str,
    question: &'a str,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct SuggestedQuestionsRequest<'a> {
    context: &'a str,
}

// ------------------------------
// Types received from the server
// ------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
pub struct ChatResponse {
    pub answer: String,
    pub in_scope: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
pub struct SuggestedQuestionsResponse {
    #[serde(default)]
    pub suggestions: Vec<String>,
}

// -----------
// Conversions
// -----------

#[inline]
pub fn create_chat_request(req: &AnswerRequest) -> ChatRequest<'_> {
    ChatRequest {
        context: &req.context,
        question: &req.question,
    }
}

#[inline]
pub fn create_suggestions_request(
    req: &SuggestionsRequest,
) -> SuggestedQuestionsRequest<'_> {
    SuggestedQuestionsRequest {
        context: &req.context,
    }
}

impl From<ChatResponse> for Answer {
    #[inline]
    fn from(resp: ChatResponse) -> Self {
        Answer {
            answer: resp.answer,
            in_scope: resp.in_scope,
        }
    }
}

impl From<SuggestedQuestionsResponse> for Suggestions {
    #[inline]
    fn from(resp: SuggestedQuestionsResponse) -> Self {
        Suggestions {
            suggestions: resp.suggestions,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_create_chat_request() {
        let request = AnswerRequest {
            context: "A blog post about owls.".to_owned(),
            question: "What is this page about?".to_owned(),
        };
        let body = serde_json::to_value(create_chat_request(&request)).unwrap();
        assert_eq!(
            body,
            json!({
                "context": "A blog post about owls.",
                "question": "What is this page about?"
            })
        );
    }

    #[test]
    fn test_create_suggestions_request() {
        let request = SuggestionsRequest {
            context: "https://a.test".to_owned(),
        };
        let body =
            serde_json::to_value(create_suggestions_request(&request)).unwrap();
        assert_eq!(body, json!({ "context": "https://a.test" }));
    }

    #[test]
    fn test_parse_responses() {
        let chat: ChatResponse = serde_json::from_value(json!({
            "answer": "It's a blog post.",
            "in_scope": true
        }))
        .unwrap();
        assert_eq!(
            Answer::from(chat),
            Answer {
                answer: "It's a blog post.".to_owned(),
                in_scope: true,
            }
        );

        // A missing list is treated as no suggestions at all.
        let suggestions: SuggestedQuestionsResponse =
            serde_json::from_value(json!({})).unwrap();
        assert!(Suggestions::from(suggestions).suggestions.is_empty());
    }
}
