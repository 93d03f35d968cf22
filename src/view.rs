// src/view.rs

/// Представление одной области вывода (результат или история).
/// Все изменения области идут через `replace`/`clear` — единая точка входа
/// для конкурирующих писателей, побеждает последний.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegionView {
    lines: Vec<String>,
}

impl RegionView {
    /// Полностью заменяет содержимое области.
    pub fn replace(&mut self, lines: Vec<String>) {
        self.lines = lines;
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Текст области для сообщения в чате.
    pub fn render(&self) -> String {
        self.lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_is_idempotent() {
        let mut view = RegionView::default();
        let lines = vec!["a".to_string(), "b".to_string()];
        view.replace(lines.clone());
        let first = view.render();
        view.replace(lines);
        assert_eq!(view.render(), first);
    }

    #[test]
    fn test_replace_overwrites_previous_content() {
        let mut view = RegionView::default();
        view.replace(vec!["old".to_string(), "lines".to_string()]);
        view.replace(vec!["new".to_string()]);
        assert_eq!(view.lines(), ["new".to_string()]);
        assert_eq!(view.render(), "new");
    }

    #[test]
    fn test_clear_empties_the_region() {
        let mut view = RegionView::default();
        view.replace(vec!["x".to_string()]);
        view.clear();
        assert!(view.is_empty());
        assert_eq!(view.render(), "");
    }
}
