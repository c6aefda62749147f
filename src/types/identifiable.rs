/// Trait to describe oneself
pub trait Identifiable {
    /// Return ID of self
    fn get_id(&self) -> &str;

    /// Return name of self
    fn get_name(&self) -> &str;

    /// Return a title to display in a list
    fn get_title(&self) -> String {
        let name = self.get_name();
        if name.is_empty() {
            "(Unnamed)".to_string()
        } else {
            name.to_string()
        }
    }
}
