// src/bidding/validator.rs

use serde_json::Value;
use tracing::error;

use crate::model::bid_request::BidRequest;
use crate::model::params::MichaoParams;

/// 参数校验结果。是否打印诊断日志由调用方根据结果决定
#[derive(Debug, Clone, PartialEq)]
pub enum ParamsValidation {
    Valid(MichaoParams),
    /// params 是对象，但 site / placement 缺失或格式错误
    MalformedFields,
    /// params 缺失或不是对象，属于调用方误用
    NotAnObject,
}

impl ParamsValidation {
    pub fn is_valid(&self) -> bool {
        matches!(self, ParamsValidation::Valid(_))
    }
}

pub fn validate(bid: &BidRequest) -> ParamsValidation {
    let Some(Value::Object(bag)) = &bid.params else {
        return ParamsValidation::NotAnObject;
    };
    match MichaoParams::from_bag(bag) {
        Some(params) => ParamsValidation::Valid(params),
        None => ParamsValidation::MalformedFields,
    }
}

/// 框架入口：只有字段格式错误时打印一条诊断
pub fn is_bid_request_valid(bid: &BidRequest) -> bool {
    match validate(bid) {
        ParamsValidation::Valid(_) => true,
        ParamsValidation::MalformedFields => {
            error!(bid_id = %bid.bid_id, "Michao: wrong format of site or placement.");
            false
        }
        ParamsValidation::NotAnObject => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tracing::{Event, Subscriber};
    use tracing_subscriber::layer::{Context, SubscriberExt};
    use tracing_subscriber::{Layer, Registry};

    struct CountingLayer(Arc<AtomicUsize>);

    impl<S: Subscriber> Layer<S> for CountingLayer {
        fn on_event(&self, _event: &Event<'_>, _ctx: Context<'_, S>) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn bid_with_params(params: Option<Value>) -> BidRequest {
        BidRequest {
            bid_id: "22c4871113f461".to_string(),
            params,
            ..Default::default()
        }
    }

    /// 返回 (校验结果, 打印的日志条数)
    fn check(bid: &BidRequest) -> (bool, usize) {
        let count = Arc::new(AtomicUsize::new(0));
        let subscriber = Registry::default().with(CountingLayer(count.clone()));
        let valid = tracing::subscriber::with_default(subscriber, || is_bid_request_valid(bid));
        (valid, count.load(Ordering::SeqCst))
    }

    #[test]
    fn valid_numeric_params() {
        let bid = bid_with_params(Some(json!({ "site": 123, "placement": 234 })));
        assert_eq!(check(&bid), (true, 0));
    }

    #[test]
    fn numeric_strings_are_accepted() {
        let bid = bid_with_params(Some(json!({ "site": "123", "placement": "456" })));
        assert!(validate(&bid).is_valid());
    }

    #[test]
    fn malformed_fields_log_once() {
        for params in [
            json!({ "site": "123", "placement": "super-placement" }),
            json!({ "site": "Infinity", "placement": 456 }),
            json!({ "site": 0, "placement": 456 }),
            json!({ "placement": 456 }),
            json!({}),
        ] {
            let bid = bid_with_params(Some(params));
            assert_eq!(validate(&bid), ParamsValidation::MalformedFields);
            assert_eq!(check(&bid), (false, 1));
        }
    }

    #[test]
    fn non_object_params_are_silent() {
        for params in [None, Some(json!(null)), Some(json!("site=1")), Some(json!(42)), Some(json!([1, 2]))] {
            let bid = bid_with_params(params);
            assert_eq!(validate(&bid), ParamsValidation::NotAnObject);
            assert_eq!(check(&bid), (false, 0));
        }
    }

    #[test]
    fn validation_does_not_mutate_input() {
        let bid = bid_with_params(Some(json!({ "site": "12", "placement": 3 })));
        let before = bid.clone();
        validate(&bid);
        assert_eq!(bid, before);
    }

    proptest! {
        #[test]
        fn positive_ids_always_validate(site in 1u64..u32::MAX as u64, placement in 0.001f64..1e9, as_string in any::<bool>()) {
            let placement = if as_string { json!(placement.to_string()) } else { json!(placement) };
            let bid = bid_with_params(Some(json!({ "site": site, "placement": placement })));
            prop_assert!(validate(&bid).is_valid());
        }

        #[test]
        fn non_positive_ids_never_validate(site in -1e9f64..=0.0, placement in 1u64..1000) {
            let bid = bid_with_params(Some(json!({ "site": site, "placement": placement })));
            prop_assert_eq!(validate(&bid), ParamsValidation::MalformedFields);
        }

        #[test]
        fn alphabetic_ids_never_validate(word in "[a-zA-Z][a-zA-Z-]{0,15}", site in 1u64..1000) {
            let bid = bid_with_params(Some(json!({ "site": site, "placement": word })));
            prop_assert_eq!(validate(&bid), ParamsValidation::MalformedFields);
        }
    }
}
