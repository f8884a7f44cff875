use super::types::FilterOrderInfo;

pub struct FilterOrder;

impl FilterOrder {
    /// `order=col.dir,col.dir`, or nothing when no ordering was requested
    pub fn generate(infos: &[FilterOrderInfo]) -> Option<(String, String)> {
        if infos.is_empty() {
            return None;
        }
        let parts: Vec<String> = infos
            .iter()
            .map(|i| format!("{}.{}", i.column, i.sort.to_postgrest()))
            .collect();
        Some(("order".to_string(), parts.join(",")))
    }
}
