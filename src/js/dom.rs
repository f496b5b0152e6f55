// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Stub browser environment for the instrumentation challenge
//!
//! The challenge script expects to run on a blank page in a real browser.
//! These scripts give it enough of `window`, `document` and `navigator` to
//! compute its fingerprint, and route timers and console output to the host
//! natives installed by the runtime (`__host*`).

use std::time::Duration;

/// Browser globals installed before anything else runs
///
/// Reads `__hostUserAgent` for the navigator strings.
pub const PRELUDE: &str = r#"
(function (global) {
  var noop = function () {};
  var ua = String(global.__hostUserAgent || '');

  global.window = global;
  global.self = global;
  global.top = global;
  global.parent = global;
  global.frames = global;

  function walk(node, pred, out) {
    for (var i = 0; i < node.childNodes.length; i++) {
      var child = node.childNodes[i];
      if (pred(child)) out.push(child);
      walk(child, pred, out);
    }
    return out;
  }

  function matcher(selector) {
    selector = String(selector).trim();
    var m;
    if ((m = /^#([\w-]+)$/.exec(selector))) {
      return function (n) { return n.id === m[1]; };
    }
    if ((m = /^\[name=["']?([^"'\]]+)["']?\]$/.exec(selector))) {
      return function (n) { return n.getAttribute && n.getAttribute('name') === m[1]; };
    }
    if ((m = /^([\w-]+)$/.exec(selector))) {
      var tag = m[1].toUpperCase();
      return function (n) { return n.tagName === tag; };
    }
    return function () { return false; };
  }

  function createElement(tagName) {
    var tag = String(tagName).toUpperCase();
    var el = {
      tagName: tag,
      nodeName: tag,
      nodeType: 1,
      id: '',
      name: '',
      className: '',
      value: '',
      innerHTML: '',
      textContent: '',
      attributes: {},
      style: {},
      dataset: {},
      childNodes: [],
      children: [],
      parentNode: null,
      classList: {
        add: noop,
        remove: noop,
        contains: function () { return false; },
        toggle: function () { return false; }
      },
      setAttribute: function (k, v) {
        this.attributes[k] = String(v);
        if (k === 'id') this.id = String(v);
        if (k === 'name') this.name = String(v);
      },
      getAttribute: function (k) {
        return Object.prototype.hasOwnProperty.call(this.attributes, k) ? this.attributes[k] : null;
      },
      hasAttribute: function (k) {
        return Object.prototype.hasOwnProperty.call(this.attributes, k);
      },
      removeAttribute: function (k) { delete this.attributes[k]; },
      appendChild: function (child) {
        if (child && child.parentNode) child.parentNode.removeChild(child);
        child.parentNode = this;
        this.childNodes.push(child);
        this.children.push(child);
        return child;
      },
      insertBefore: function (child, ref) {
        var i = this.childNodes.indexOf(ref);
        if (i < 0) return this.appendChild(child);
        child.parentNode = this;
        this.childNodes.splice(i, 0, child);
        this.children.splice(i, 0, child);
        return child;
      },
      removeChild: function (child) {
        var i = this.childNodes.indexOf(child);
        if (i >= 0) {
          this.childNodes.splice(i, 1);
          this.children.splice(i, 1);
          child.parentNode = null;
        }
        return child;
      },
      remove: function () {
        if (this.parentNode) this.parentNode.removeChild(this);
      },
      cloneNode: function () { return createElement(tag); },
      getElementsByTagName: function (t) {
        var want = String(t).toUpperCase();
        return walk(this, function (n) { return want === '*' || n.tagName === want; }, []);
      },
      querySelector: function (s) { return walk(this, matcher(s), [])[0] || null; },
      querySelectorAll: function (s) { return walk(this, matcher(s), []); },
      getBoundingClientRect: function () {
        return { x: 0, y: 0, top: 0, left: 0, right: 0, bottom: 0, width: 0, height: 0 };
      },
      getContext: function () { return null; },
      addEventListener: noop,
      removeEventListener: noop,
      dispatchEvent: function () { return true; },
      focus: noop,
      blur: noop,
      click: noop
    };
    return el;
  }

  var html = createElement('html');
  var head = createElement('head');
  var body = createElement('body');
  html.appendChild(head);
  html.appendChild(body);

  var cookies = {};
  var written = [];

  var document = {
    nodeType: 9,
    readyState: 'complete',
    visibilityState: 'visible',
    hidden: false,
    title: '',
    referrer: '',
    characterSet: 'UTF-8',
    compatMode: 'CSS1Compat',
    documentElement: html,
    head: head,
    body: body,
    childNodes: [html],
    open: function () { written = []; },
    write: function () { written.push(Array.prototype.join.call(arguments, '')); },
    writeln: function () { written.push(Array.prototype.join.call(arguments, '') + '\n'); },
    close: function () {
      head.childNodes.length = 0;
      head.children.length = 0;
      body.childNodes.length = 0;
      body.children.length = 0;
    },
    createElement: createElement,
    createElementNS: function (_ns, tag) { return createElement(tag); },
    createTextNode: function (text) {
      return { nodeType: 3, textContent: String(text), childNodes: [], parentNode: null };
    },
    createEvent: function () { return { initEvent: noop }; },
    getElementById: function (id) {
      return walk(document, function (n) { return n.id === id; }, [])[0] || null;
    },
    getElementsByName: function (name) {
      return walk(document, function (n) {
        return n.getAttribute && n.getAttribute('name') === name;
      }, []);
    },
    getElementsByTagName: function (t) { return html.getElementsByTagName(t).concat(
      String(t).toUpperCase() === 'HTML' || t === '*' ? [html] : []); },
    getElementsByClassName: function () { return []; },
    querySelector: function (s) { return walk(document, matcher(s), [])[0] || null; },
    querySelectorAll: function (s) { return walk(document, matcher(s), []); },
    hasFocus: function () { return true; },
    addEventListener: noop,
    removeEventListener: noop,
    dispatchEvent: function () { return true; }
  };
  Object.defineProperty(document, 'cookie', {
    get: function () {
      return Object.keys(cookies).map(function (k) { return k + '=' + cookies[k]; }).join('; ');
    },
    set: function (line) {
      var pair = String(line).split(';')[0];
      var eq = pair.indexOf('=');
      if (eq > 0) cookies[pair.slice(0, eq).trim()] = pair.slice(eq + 1).trim();
    }
  });
  global.document = document;

  global.location = {
    href: 'about:blank',
    protocol: 'about:',
    host: '',
    hostname: '',
    port: '',
    pathname: 'blank',
    search: '',
    hash: '',
    origin: 'null',
    assign: noop,
    replace: noop,
    reload: noop,
    toString: function () { return this.href; }
  };

  global.navigator = {
    userAgent: ua,
    appVersion: ua.replace(/^Mozilla\//, ''),
    appName: 'Netscape',
    appCodeName: 'Mozilla',
    product: 'Gecko',
    productSub: '20030107',
    vendor: 'Google Inc.',
    vendorSub: '',
    language: 'en-US',
    languages: ['en-US', 'en'],
    platform: /Mac OS X/.test(ua) ? 'MacIntel' : (/Windows/.test(ua) ? 'Win32' : 'Linux x86_64'),
    hardwareConcurrency: 8,
    deviceMemory: 8,
    maxTouchPoints: 0,
    cookieEnabled: true,
    doNotTrack: null,
    onLine: true,
    webdriver: false,
    plugins: { length: 0, item: function () { return null; }, refresh: noop },
    mimeTypes: { length: 0, item: function () { return null; } },
    javaEnabled: function () { return false; },
    sendBeacon: function () { return true; }
  };

  global.screen = {
    width: 1920,
    height: 1080,
    availWidth: 1920,
    availHeight: 1055,
    colorDepth: 24,
    pixelDepth: 24,
    orientation: { type: 'landscape-primary', angle: 0 }
  };
  global.innerWidth = 1920;
  global.innerHeight = 960;
  global.outerWidth = 1920;
  global.outerHeight = 1055;
  global.devicePixelRatio = 1;
  global.screenX = 0;
  global.screenY = 0;
  global.scrollX = 0;
  global.scrollY = 0;

  global.addEventListener = noop;
  global.removeEventListener = noop;
  global.dispatchEvent = function () { return true; };
  global.getComputedStyle = function () {
    return { getPropertyValue: function () { return ''; } };
  };
  global.matchMedia = function (q) {
    return { matches: false, media: String(q), addListener: noop, removeListener: noop };
  };

  function format(args) {
    return Array.prototype.map.call(args, function (a) {
      try { return typeof a === 'string' ? a : JSON.stringify(a); } catch (e) { return String(a); }
    }).join(' ');
  }
  global.console = {
    log: function () { __hostLog('log', format(arguments)); },
    info: function () { __hostLog('info', format(arguments)); },
    debug: function () { __hostLog('debug', format(arguments)); },
    warn: function () { __hostLog('warn', format(arguments)); },
    error: function () { __hostLog('error', format(arguments)); },
    trace: noop,
    table: noop,
    group: noop,
    groupEnd: noop
  };

  var callbacks = {};
  function arm(handler, delay, args, repeat) {
    var fn = typeof handler === 'function'
      ? handler
      : function () { (0, eval)(String(handler)); };
    var id = __hostSchedule(Number(delay) || 0, repeat);
    callbacks[id] = { fn: fn, args: args, repeat: repeat };
    return id;
  }
  function disarm(id) {
    if (callbacks[id]) {
      delete callbacks[id];
      __hostCancel(id);
    }
  }
  global.setTimeout = function (handler, delay) {
    return arm(handler, delay, Array.prototype.slice.call(arguments, 2), false);
  };
  global.setInterval = function (handler, delay) {
    return arm(handler, delay, Array.prototype.slice.call(arguments, 2), true);
  };
  global.clearTimeout = disarm;
  global.clearInterval = disarm;
  global.requestAnimationFrame = function (cb) {
    return arm(function () { cb(__hostNow()); }, 16, [], false);
  };
  global.cancelAnimationFrame = disarm;
  global.queueMicrotask = function (cb) { Promise.resolve().then(cb); };
  global.__hostFire = function (id) {
    var t = callbacks[id];
    if (!t) return;
    if (!t.repeat) delete callbacks[id];
    try {
      t.fn.apply(global, t.args);
    } catch (e) {
      __hostLog('error', 'uncaught in timer: ' + String(e));
    }
  };

  global.performance = {
    now: function () { return __hostNow(); },
    timeOrigin: Date.now(),
    timing: { navigationStart: Date.now() },
    mark: noop,
    measure: noop,
    getEntriesByType: function () { return []; }
  };

  var chars = 'ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/';
  global.btoa = function (input) {
    var str = String(input);
    var out = '';
    for (var i = 0; i < str.length; i += 3) {
      var a = str.charCodeAt(i);
      var b = str.charCodeAt(i + 1);
      var c = str.charCodeAt(i + 2);
      if (a > 255 || b > 255 || c > 255) throw new Error('InvalidCharacterError');
      var n = (a << 16) | ((b || 0) << 8) | (c || 0);
      out += chars.charAt((n >> 18) & 63) + chars.charAt((n >> 12) & 63) +
        (i + 1 < str.length ? chars.charAt((n >> 6) & 63) : '=') +
        (i + 2 < str.length ? chars.charAt(n & 63) : '=');
    }
    return out;
  };
  global.atob = function (input) {
    var str = String(input).replace(/[\s=]+/g, '');
    var out = '';
    var buffer = 0;
    var bits = 0;
    for (var i = 0; i < str.length; i++) {
      var v = chars.indexOf(str.charAt(i));
      if (v < 0) throw new Error('InvalidCharacterError');
      buffer = (buffer << 6) | v;
      bits += 6;
      if (bits >= 8) {
        bits -= 8;
        out += String.fromCharCode((buffer >> bits) & 255);
      }
    }
    return out;
  };
})(globalThis);
"#;

/// Blank page written into the document before the challenge runs
pub const BLANK_PAGE: &str = r#"document.open(); document.write("<!DOCTYPE html><html><head></head><body></body></html>"); document.close();"#;

/// Wrapper that evaluates `__challengeSource` and reports back through `__hostSettle`
///
/// `getElementsByName('ui_metrics')` is replaced before the script runs; the
/// first write to the returned element's `value` resolves the outcome. A throw
/// or `wait` elapsing without a write rejects it.
pub fn capture_wrapper(wait: Duration) -> String {
    format!(
        r#"
(function () {{
  new Promise(function (resolve, reject) {{
    var original = document.getElementsByName;
    document.getElementsByName = function (name) {{
      if (name === 'ui_metrics') {{
        return [{{
          set value(v) {{ resolve(v); }},
          get value() {{ return undefined; }}
        }}];
      }}
      return original.apply(this, arguments);
    }};
    try {{
      (0, eval)(__challengeSource);
    }} catch (e) {{
      reject('Error during eval: ' + String(e));
    }}
    setTimeout(function () {{
      reject('timed out waiting for ui_metrics.value to be set');
    }}, {wait_ms});
  }}).then(function (v) {{
    if (typeof v === 'string') {{
      __hostSettle(0, v);
    }} else {{
      __hostSettle(2, typeof v);
    }}
  }}, function (e) {{
    __hostSettle(1, String(e));
  }});
}})();
"#,
        wait_ms = wait.as_millis()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrapper_embeds_wait() {
        let wrapper = capture_wrapper(Duration::from_secs(5));
        assert!(wrapper.contains("}, 5000);"));
        assert!(wrapper.contains("ui_metrics"));
    }

    #[test]
    fn test_prelude_wires_host_natives() {
        for native in ["__hostSchedule", "__hostCancel", "__hostNow", "__hostLog"] {
            assert!(PRELUDE.contains(native), "{}", native);
        }
    }
}
