use anyhow::{Context, Result};
use std::path::Path;
use std::time::Duration;
use thirtyfour::prelude::*;
use thirtyfour::{ChromiumLikeCapabilities, WindowHandle};
use tokio::runtime::Runtime;

use crate::config::SettingsConfig;
use crate::dom::{Dom, DomError, DomResult, Key, Locator};

pub struct Browser {
    rt: Runtime,
    driver: WebDriver,
    main_window: WindowHandle,
}

impl Browser {
    pub fn connect(settings: &SettingsConfig) -> Result<Self> {
        let rt = Runtime::new().context("Failed to start async runtime")?;

        let mut caps = DesiredCapabilities::chrome();
        // Reuse a profile so the site session survives between runs
        if let Some(profile) = &settings.chrome_profile {
            caps.add_arg(&format!("--user-data-dir={}", profile.display()))?;
        }
        if settings.run_in_background {
            caps.add_arg("--headless=new")?;
        }
        caps.add_arg("--start-maximized")?;

        let driver = rt
            .block_on(WebDriver::new(settings.webdriver_url.as_str(), caps))
            .with_context(|| {
                format!(
                    "Failed to connect to WebDriver at {}. Is chromedriver running?",
                    settings.webdriver_url
                )
            })?;
        let main_window = rt.block_on(driver.window())?;

        Ok(Browser { rt, driver, main_window })
    }

    pub fn quit(self) -> Result<()> {
        let Browser { rt, driver, .. } = self;
        rt.block_on(driver.quit()).context("Failed to close the browser")
    }

    fn block_on<T>(&self, fut: impl Future<Output = WebDriverResult<T>>) -> DomResult<T> {
        self.rt.block_on(fut).map_err(classify)
    }
}

fn by(locator: &Locator) -> By {
    match locator {
        Locator::Css(sel) => By::Css(sel.to_string()),
        Locator::XPath(expr) => By::XPath(expr.to_string()),
    }
}

/// WebDriver reports the interesting conditions only in the message text.
fn classify(error: WebDriverError) -> DomError {
    classify_message(&error.to_string())
}

fn classify_message(message: &str) -> DomError {
    let lower = message.to_lowercase();
    if lower.contains("stale element") {
        DomError::StaleElement
    } else if lower.contains("click intercepted") {
        DomError::ClickIntercepted(message.to_string())
    } else if lower.contains("not interactable") {
        DomError::NotInteractable(message.to_string())
    } else if ["invalid session id", "no such window", "session deleted", "disconnected", "connection refused"]
        .iter()
        .any(|m| lower.contains(m))
    {
        DomError::SessionLost(message.to_string())
    } else if lower.contains("timeout") || lower.contains("timed out") {
        DomError::Timeout(message.to_string())
    } else {
        DomError::Other(message.to_string())
    }
}

impl Dom for Browser {
    type Element = WebElement;

    fn find_all(&self, scope: Option<&WebElement>, locator: &Locator) -> DomResult<Vec<WebElement>> {
        let by = by(locator);
        match scope {
            Some(element) => self.block_on(element.find_all(by)),
            None => self.block_on(self.driver.find_all(by)),
        }
    }

    fn text(&self, element: &WebElement) -> DomResult<String> {
        self.block_on(element.text())
    }

    fn attr(&self, element: &WebElement, name: &str) -> DomResult<Option<String>> {
        self.block_on(element.attr(name))
    }

    fn prop(&self, element: &WebElement, name: &str) -> DomResult<Option<String>> {
        self.block_on(element.prop(name))
    }

    fn tag_name(&self, element: &WebElement) -> DomResult<String> {
        self.block_on(element.tag_name())
    }

    fn is_selected(&self, element: &WebElement) -> DomResult<bool> {
        self.block_on(element.is_selected())
    }

    fn click(&self, element: &WebElement) -> DomResult<()> {
        self.block_on(element.click())
    }

    fn native_click(&self, element: &WebElement) -> DomResult<()> {
        self.block_on(async {
            let arg = element.to_json()?;
            self.driver.execute("arguments[0].click();", vec![arg]).await?;
            Ok(())
        })
    }

    fn clear(&self, element: &WebElement) -> DomResult<()> {
        self.block_on(element.clear())
    }

    fn type_text(&self, element: &WebElement, text: &str) -> DomResult<()> {
        self.block_on(element.send_keys(text))
    }

    fn scroll_into_view(&self, element: &WebElement) -> DomResult<()> {
        self.block_on(element.scroll_into_view())
    }

    fn press_key(&self, key: Key) -> DomResult<()> {
        let key = match key {
            Key::Escape => thirtyfour::Key::Escape,
            Key::ArrowDown => thirtyfour::Key::Down,
            Key::Enter => thirtyfour::Key::Enter,
        };
        self.block_on(async {
            let active = self.driver.active_element().await?;
            active.send_keys(key).await
        })
    }

    fn current_url(&self) -> DomResult<String> {
        self.block_on(self.driver.current_url()).map(|url| url.to_string())
    }

    fn navigate(&self, url: &str) -> DomResult<()> {
        self.block_on(self.driver.goto(url))
    }

    fn screenshot(&self, path: &Path) -> DomResult<()> {
        self.block_on(self.driver.screenshot(path))
    }

    fn window_count(&self) -> DomResult<usize> {
        self.block_on(self.driver.windows()).map(|w| w.len())
    }

    fn switch_to_newest_window(&self) -> DomResult<()> {
        self.block_on(async {
            let windows = self.driver.windows().await?;
            if let Some(newest) = windows.last() {
                self.driver.switch_to_window(newest.clone()).await?;
            }
            Ok(())
        })
    }

    fn close_current_window(&self) -> DomResult<()> {
        self.block_on(self.driver.close_window())
    }

    fn switch_to_main_window(&self) -> DomResult<()> {
        self.block_on(self.driver.switch_to_window(self.main_window.clone()))
    }

    fn pause(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[yare::parameterized(
        stale = { "stale element reference: element is not attached to the page document", DomError::StaleElement },
        gone = { "invalid session id", DomError::SessionLost("invalid session id".to_string()) },
        closed = { "no such window: target window already closed", DomError::SessionLost("no such window: target window already closed".to_string()) },
    )]
    fn test_classify_message(message: &str, expected: DomError) {
        assert_eq!(classify_message(message), expected);
    }

    #[test]
    fn test_classify_message_kinds() {
        assert!(classify_message("element click intercepted: Other element would receive the click").is_transient());
        assert!(matches!(classify_message("element not interactable"), DomError::NotInteractable(_)));
        assert!(matches!(classify_message("no such element"), DomError::Other(_)));
    }

    #[test]
    #[ignore] // Needs chromedriver on localhost:9515
    fn test_connect_and_navigate() {
        let browser = Browser::connect(&SettingsConfig::default()).expect("webdriver");
        browser.navigate("about:blank").unwrap();
        assert!(browser.current_url().unwrap().starts_with("about:blank"));
        browser.quit().unwrap();
    }
}
