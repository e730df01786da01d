// src/model/params.rs

use serde::Serialize;
use serde_json::{Map, Value};

/// 数值型 ID（site / placement）。
/// `text` 是写入 OpenRTB 的字符串形式：数字按数值格式化，字符串去掉首尾空白。
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct NumericId {
    pub value: f64,
    pub text: String,
}

impl NumericId {
    /// 接受数字或数字字符串，必须是有限且大于 0 的值
    pub fn coerce(raw: &Value) -> Option<Self> {
        let (value, text) = match raw {
            Value::Number(n) => {
                let value = n.as_f64()?;
                let text = if n.is_f64() { format!("{}", value) } else { n.to_string() };
                (value, text)
            }
            Value::String(s) => {
                let trimmed = s.trim();
                (trimmed.parse::<f64>().ok()?, trimmed.to_string())
            }
            _ => return None,
        };
        (value.is_finite() && value > 0.0).then_some(Self { value, text })
    }
}

/// 校验通过后的 bidder 参数
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MichaoParams {
    pub site: NumericId,
    pub placement: NumericId,
    pub reward: bool,
    pub bid_floor: f64,
    pub partner: Option<String>,
    pub bcat: Option<Vec<String>>,
    pub badv: Option<Vec<String>>,
    pub schain: Option<Value>,
}

impl MichaoParams {
    /// site 或 placement 不合法时返回 None；可选字段格式不对时按缺省处理
    pub fn from_bag(bag: &Map<String, Value>) -> Option<Self> {
        let site = bag.get("site").and_then(NumericId::coerce)?;
        let placement = bag.get("placement").and_then(NumericId::coerce)?;
        Some(Self {
            site,
            placement,
            reward: bag.get("reward").is_some_and(truthy),
            bid_floor: bag.get("bidFloor").and_then(floor_value).unwrap_or(0.0),
            partner: bag.get("partner").and_then(scalar_text),
            bcat: bag.get("bcat").and_then(string_list),
            badv: bag.get("badv").and_then(string_list),
            schain: bag.get("schain").filter(|v| v.is_object()).cloned(),
        })
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0 && !v.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn floor_value(value: &Value) -> Option<f64> {
    let floor = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (floor.is_finite() && floor >= 0.0).then_some(floor)
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn string_list(value: &Value) -> Option<Vec<String>> {
    let list: Vec<String> = value
        .as_array()?
        .iter()
        .filter_map(|v| v.as_str().map(str::to_string))
        .collect();
    (!list.is_empty()).then_some(list)
}
