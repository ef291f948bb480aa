//! Apple Vision APIによる認識エンジン
//!
//! osascript (JavaScript for Automation) 経由でVNRecognizeTextRequestを実行し、
//! 結果をJSONで受け取る。

use super::{assemble_text, Observation, Recognizer};
use crate::error::RecognitionError;
use crate::image_loader::DecodedImage;
use serde::Deserialize;
use std::ffi::OsStr;
use std::io::Read;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// テキスト認識スクリプト
///
/// 引数: argv[0] = 画像パス, argv[1] = 言語タグのJSON配列
const RECOGNIZE_SCRIPT: &str = r#"
ObjC.import('Foundation');
ObjC.import('Vision');

function run(argv) {
    const url = $.NSURL.fileURLWithPath(argv[0]);
    const languages = JSON.parse(argv[1]);
    let reply = null;

    const request = $.VNRecognizeTextRequest.alloc.initWithCompletionHandler((req, error) => {
        if (reply !== null) {
            return;
        }
        if (error && !error.isNil()) {
            reply = { status: 'recognition_error', message: ObjC.unwrap(error.localizedDescription) };
            return;
        }
        const results = req.results;
        if (!results || results.isNil()) {
            reply = { status: 'ok', observations: null };
            return;
        }
        const observations = [];
        for (let i = 0; i < results.count; i++) {
            const item = results.objectAtIndex(i);
            if (!item.isKindOfClass($.VNRecognizedTextObservation)) {
                reply = { status: 'ok', observations: null };
                return;
            }
            const top = item.topCandidates(1);
            const candidates = [];
            if (top.count > 0) {
                candidates.push(ObjC.unwrap(top.objectAtIndex(0).string));
            }
            observations.push({ candidates: candidates });
        }
        reply = { status: 'ok', observations: observations };
    });

    // 0 = VNRequestTextRecognitionLevelAccurate
    request.recognitionLevel = 0;
    request.automaticallyDetectsLanguage = true;
    request.usesLanguageCorrection = true;
    request.recognitionLanguages = $(languages);

    const handler = $.VNImageRequestHandler.alloc.initWithURLOptions(url, $.NSDictionary.dictionary);
    const error = Ref();
    const performed = handler.performRequestsError($([request]), error);
    const recognized = reply !== null && reply.status === 'ok' && reply.observations !== null;
    if (!performed && !recognized) {
        return JSON.stringify({ status: 'execution_error', message: ObjC.unwrap(error[0].localizedDescription) });
    }
    return JSON.stringify(reply || { status: 'no_result' });
}
"#;

/// 対応言語一覧の取得スクリプト
const LANGUAGES_SCRIPT: &str = r#"
ObjC.import('Foundation');
ObjC.import('Vision');

function run() {
    const request = $.VNRecognizeTextRequest.alloc.init;
    request.recognitionLevel = 0;
    const error = Ref();
    const languages = request.supportedRecognitionLanguagesAndReturnError(error);
    if (!languages || languages.isNil()) {
        return JSON.stringify({ status: 'execution_error', message: ObjC.unwrap(error[0].localizedDescription) });
    }
    return JSON.stringify({ status: 'ok', languages: ObjC.deepUnwrap(languages) });
}
"#;

/// 終了待ちのポーリング間隔
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// スクリプトからの応答
#[derive(Debug, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum EngineReply {
    Ok {
        #[serde(default)]
        observations: Option<Vec<Observation>>,
        #[serde(default)]
        languages: Option<Vec<String>>,
    },
    RecognitionError {
        message: String,
    },
    ExecutionError {
        message: String,
    },
    /// 完了ハンドラが呼ばれなかった
    NoResult,
}

/// Apple Vision APIを使う認識エンジン
pub struct VisionRecognizer {
    timeout: Option<Duration>,
}

impl VisionRecognizer {
    /// 新しいVisionRecognizerを作成
    ///
    /// `timeout_seconds`がNoneの場合はエンジンの完了まで待ち続ける
    pub fn new(timeout_seconds: Option<u64>) -> Self {
        Self {
            timeout: timeout_seconds.map(Duration::from_secs),
        }
    }

    /// JXAスクリプトを実行して標準出力を返す
    fn run_script(&self, script: &str, args: &[&OsStr]) -> Result<String, RecognitionError> {
        let mut command = Command::new("osascript");
        command
            .arg("-l")
            .arg("JavaScript")
            .arg("-e")
            .arg(script)
            .args(args);
        run_process(command, self.timeout)
    }
}

impl Recognizer for VisionRecognizer {
    fn recognize(
        &self,
        image: &DecodedImage,
        languages: &[String],
    ) -> Result<String, RecognitionError> {
        // エンジンにはデコード済みのビットマップを渡す
        let png = tempfile::Builder::new()
            .prefix("ocrtool-")
            .suffix(".png")
            .tempfile()
            .map_err(|e| RecognitionError::Execution(e.to_string()))?;
        image
            .write_png(png.path())
            .map_err(|e| RecognitionError::Execution(e.to_string()))?;

        let languages_json = serde_json::to_string(languages)
            .map_err(|e| RecognitionError::Execution(e.to_string()))?;

        debug!(
            "Visionで認識します: {} ({}x{}) 言語: {}",
            image.path().display(),
            image.width(),
            image.height(),
            languages_json
        );

        let reply = self.run_script(
            RECOGNIZE_SCRIPT,
            &[png.path().as_os_str(), OsStr::new(&languages_json)],
        )?;
        parse_recognition_reply(&reply)
    }

    fn supported_languages(&self) -> Result<Vec<String>, RecognitionError> {
        let reply = self.run_script(LANGUAGES_SCRIPT, &[])?;
        parse_languages_reply(&reply)
    }
}

/// 認識スクリプトの応答を解釈
fn parse_recognition_reply(reply: &str) -> Result<String, RecognitionError> {
    match parse_reply(reply)? {
        EngineReply::Ok {
            observations: Some(observations),
            ..
        } => {
            debug!("{}件のテキスト領域を検出しました", observations.len());
            Ok(assemble_text(&observations))
        }
        EngineReply::Ok { observations: None, .. } => Err(RecognitionError::NoObservations),
        EngineReply::RecognitionError { message } => Err(RecognitionError::Recognition(message)),
        EngineReply::ExecutionError { message } => Err(RecognitionError::Execution(message)),
        EngineReply::NoResult => Err(RecognitionError::NoResult),
    }
}

/// 対応言語スクリプトの応答を解釈
fn parse_languages_reply(reply: &str) -> Result<Vec<String>, RecognitionError> {
    match parse_reply(reply)? {
        EngineReply::Ok {
            languages: Some(languages),
            ..
        } => Ok(languages),
        EngineReply::Ok { languages: None, .. } => Err(RecognitionError::Execution(
            "engine returned no language list".to_string(),
        )),
        EngineReply::RecognitionError { message } | EngineReply::ExecutionError { message } => {
            Err(RecognitionError::Execution(message))
        }
        EngineReply::NoResult => Err(RecognitionError::NoResult),
    }
}

fn parse_reply(reply: &str) -> Result<EngineReply, RecognitionError> {
    serde_json::from_str(reply.trim()).map_err(|e| {
        warn!("エンジンの応答を解析できません: {}", e);
        RecognitionError::Execution(format!("unexpected engine output: {}", e))
    })
}

/// プロセスを起動し、終了まで（またはタイムアウトまで）ブロックする
///
/// パイプは別スレッドで読み切り、1回だけチャネルへ送る
fn run_process(mut command: Command, timeout: Option<Duration>) -> Result<String, RecognitionError> {
    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| RecognitionError::Execution(e.to_string()))?;

    let stdout = spawn_reader(child.stdout.take());
    let stderr = spawn_reader(child.stderr.take());

    let status = wait_for_exit(&mut child, timeout)?;

    let stdout = stdout
        .recv()
        .map_err(|e| RecognitionError::Execution(e.to_string()))?;
    let stderr = stderr
        .recv()
        .map_err(|e| RecognitionError::Execution(e.to_string()))?;

    if !status.success() {
        let stderr = String::from_utf8_lossy(&stderr).trim().to_string();
        warn!("エンジンプロセスが失敗しました ({}): {}", status, stderr);
        return Err(RecognitionError::Execution(stderr));
    }

    Ok(String::from_utf8_lossy(&stdout).into_owned())
}

fn spawn_reader<R: Read + Send + 'static>(pipe: Option<R>) -> Receiver<Vec<u8>> {
    let (tx, rx) = mpsc::sync_channel(1);
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        let _ = tx.send(buf);
    });
    rx
}

fn wait_for_exit(child: &mut Child, timeout: Option<Duration>) -> Result<ExitStatus, RecognitionError> {
    // 表現できない期限は期限無しとして扱う
    let Some((timeout, deadline)) =
        timeout.and_then(|t| Instant::now().checked_add(t).map(|deadline| (t, deadline)))
    else {
        return child
            .wait()
            .map_err(|e| RecognitionError::Execution(e.to_string()));
    };

    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(status),
            Ok(None) if Instant::now() >= deadline => {
                warn!("エンジンが{}秒以内に応答しませんでした", timeout.as_secs());
                let _ = child.kill();
                let _ = child.wait();
                return Err(RecognitionError::Timeout(timeout.as_secs()));
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(e) => return Err(RecognitionError::Execution(e.to_string())),
        }
    }
}
