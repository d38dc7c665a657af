use crate::input::final_prompt;
use crate::models::{
    ChatPayload, ImagePayload, Message, NormalizedInput, Provider, ProviderPayload,
    WorkerEnvelope,
};

/**
 * \brief 按 Provider 选择请求形状并包装成外层信封。
 */
pub fn build_payload(input: &NormalizedInput) -> WorkerEnvelope {
    let prompt = final_prompt(input);
    let payload = match input.provider {
        Provider::GoogleImage => ProviderPayload::Image(ImagePayload {
            prompt,
            aspect_ratio: input.aspect_ratio.clone(),
        }),
        Provider::OpenAI | Provider::Google | Provider::Anthropic => {
            ProviderPayload::Chat(ChatPayload {
                model: input.model.clone(),
                messages: vec![Message {
                    role: "user".to_string(),
                    content: prompt,
                }],
                temperature: input.temperature,
                max_tokens: input.max_tokens,
            })
        }
    };
    WorkerEnvelope {
        provider: input.provider,
        payload,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn input(provider: Provider) -> NormalizedInput {
        NormalizedInput {
            column_data: "row 1".into(),
            prompt: "Describe".into(),
            secret_key: "k".into(),
            provider,
            model: "gpt-4o-mini".into(),
            temperature: 0.6,
            max_tokens: 200,
            aspect_ratio: "16:9".into(),
        }
    }

    fn payload_keys(envelope: &WorkerEnvelope) -> Vec<String> {
        let v = serde_json::to_value(envelope).expect("to value");
        let mut keys: Vec<String> = v["payload"]
            .as_object()
            .expect("payload object")
            .keys()
            .cloned()
            .collect();
        keys.sort();
        keys
    }

    #[test]
    fn test_image_provider_builds_image_shape() {
        let env = build_payload(&input(Provider::GoogleImage));
        assert_eq!(payload_keys(&env), vec!["aspect_ratio", "prompt"]);
        let v = serde_json::to_value(&env).expect("to value");
        assert_eq!(v["provider"], "google-image");
        assert_eq!(v["payload"]["prompt"], "Describe\n\nData: row 1");
        assert_eq!(v["payload"]["aspect_ratio"], "16:9");
    }

    #[test]
    fn test_chat_providers_build_chat_shape() {
        for provider in [Provider::OpenAI, Provider::Google, Provider::Anthropic] {
            let env = build_payload(&input(provider));
            assert_eq!(
                payload_keys(&env),
                vec!["max_tokens", "messages", "model", "temperature"]
            );
            let v = serde_json::to_value(&env).expect("to value");
            assert_eq!(v["provider"], Value::String(provider.as_str().into()));
            assert_eq!(v["payload"]["messages"][0]["role"], "user");
            assert_eq!(
                v["payload"]["messages"][0]["content"],
                "Describe\n\nData: row 1"
            );
            assert_eq!(v["payload"]["messages"].as_array().map(Vec::len), Some(1));
        }
    }
}
