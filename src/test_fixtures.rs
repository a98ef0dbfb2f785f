//! Sample template project shared by the integration-style unit tests

use async_trait::async_trait;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::core::{BuildConfig, RawConfig};
use crate::icons::{IconError, ImageSource};

pub const BUILD_GRADLE: &str = r#"plugins {
    id 'com.android.application'
}

def twaManifest = [
    applicationId: 'com.template.twa',
    hostName: 'template.example.org',
    launchUrl: '/',
    name: 'Template App',
    launcherName: 'Template',
    themeColor: '#FFFFFF',
    themeColorDark: '#000000',
    navigationColor: '#000000',
    backgroundColor: '#FFFFFF',
]

android {
    compileSdkVersion 34
    defaultConfig {
        applicationId "com.template.twa"
        minSdkVersion 21
        targetSdkVersion 34
        versionCode 1
        versionName "1.0.0"
    }
}
"#;

pub const MANIFEST: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<manifest xmlns:android="http://schemas.android.com/apk/res/android"
    package="com.template.twa">

    <application
        android:icon="@mipmap/ic_launcher"
        android:roundIcon="@mipmap/ic_launcher_round"
        android:label="@string/app_name">
        <activity android:name="LauncherActivity" android:exported="true">
            <intent-filter android:autoVerify="true">
                <action android:name="android.intent.action.VIEW"/>
                <data android:scheme="https" android:host="template.example.org"/>
            </intent-filter>
        </activity>
    </application>
</manifest>
"#;

pub const STRINGS: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<resources>
    <string name="app_name">Template App</string>
    <string name="host">template.example.org</string>
    <string name="launchUrl">https://template.example.org/</string>
</resources>
"#;

pub const COLORS: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<resources>
    <color name="colorPrimary">#FFFFFF</color>
    <color name="colorPrimaryDark">#000000</color>
    <color name="backgroundColor">#FFFFFF</color>
    <color name="navigationBarColor">#000000</color>
</resources>
"#;

/// Write the template project under `root`, including a pair of legacy
/// launcher icons.
pub fn write_template(root: &Path) {
    let files = [
        ("app/build.gradle", BUILD_GRADLE),
        ("app/src/main/AndroidManifest.xml", MANIFEST),
        ("app/src/main/res/values/strings.xml", STRINGS),
        ("app/src/main/res/values/colors.xml", COLORS),
        ("app/src/main/res/mipmap-hdpi/ic_launcher.png", "old"),
        ("app/src/main/res/mipmap-hdpi/ic_launcher.webp", "old"),
        ("app/src/main/res/mipmap-anydpi-v26/ic_launcher.xml", "old"),
        ("app/src/main/res/drawable/ic_launcher_background.xml", "old"),
        ("app/src/main/res/drawable/splash.xml", "keep"),
    ];
    for (path, content) in files {
        let path = root.join(path);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }
}

pub fn config(host: &str, app: &str) -> BuildConfig {
    BuildConfig::from_raw(RawConfig {
        build_id: Some("test-build".into()),
        host_name: Some(host.into()),
        app_name: Some(app.into()),
        theme_color: Some("#336699".into()),
        ..Default::default()
    })
    .unwrap()
    .0
}

/// An opaque gradient PNG
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_fn(width, height, |x, y| {
        image::Rgba([(x * 255 / width) as u8, (y * 255 / height) as u8, 128, 255])
    });
    let mut out = std::io::Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}

/// Image source with canned bytes; `None` behaves like a 404
pub struct FakeSource {
    pub name: &'static str,
    pub bytes: Option<Vec<u8>>,
    pub inline: bool,
    pub calls: Arc<AtomicUsize>,
}

impl FakeSource {
    pub fn new(name: &'static str, bytes: Option<Vec<u8>>) -> Self {
        Self {
            name,
            bytes,
            inline: false,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn inline(bytes: Vec<u8>) -> Self {
        Self {
            inline: true,
            ..Self::new("inline", Some(bytes))
        }
    }
}

#[async_trait]
impl ImageSource for FakeSource {
    fn name(&self) -> &str {
        self.name
    }

    async fn load(&self) -> Result<Vec<u8>, IconError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.bytes.clone().ok_or(IconError::Status(404))
    }

    fn is_inline(&self) -> bool {
        self.inline
    }
}
