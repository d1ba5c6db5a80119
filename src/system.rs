//! The fixed system programs shipped with the desktop. Each one must
//! evaluate cleanly and print its sentinel line; external validators run
//! them through `runner::run` and compare output, so these texts double as
//! the interpreter's canonical regression fixtures.

pub const KERNEL: &str = r#"; ==========================================
; DAS KERNEL v4.51
; (C) 1997 Fatitech Industries
; ==========================================
; DO NOT MODIFY THIS FILE.
; System stability depends on the integrity
; of this module. Unauthorized changes will
; cause a FATAL EXCEPTION.
;
; Interrupt vector table initialization and
; process scheduler for quaternary core.

ERWACHE
DING 0 = 0
DING 1 = 255
DING 2 = 4

; Initialize IVT slots
SOLANGE DING 0 < DING 1
  DING 3 = DING 0 MOD DING 2
  WENN DING 3 = 0 DANN
    DING 4 = "IRQ_HANDLED"
  ENDE
  DING 0 = DING 0 + 1
ENDE

; Scheduler heartbeat
DING 5 = 18
DING 6 = 0
SOLANGE DING 6 < DING 5
  DING 7 = "tick"
  DING 6 = DING 6 + 1
ENDE

VORSTELLUNG "KERNEL OK"
VERNEINUNG"#;

pub const DISPLAY: &str = r#"; ==========================================
; DAS DISPLAY DRIVER v2.1
; (C) 1997 Fatitech Industries
; ==========================================
; DO NOT MODIFY THIS FILE.
; Controls CRT framebuffer and refresh
; timing. Changes will cause DISPLAY
; CORRUPTION.
;
; Manages all VORSTELLUNG operations for
; the system's 640x480 display output.

ERWACHE
DING 0 = 640
DING 1 = 480
DING 2 = 16

; Initialize color palette
DING 3 = 0
SOLANGE DING 3 < DING 2
  DING 4 = DING 3 * 16
  DING 3 = DING 3 + 1
ENDE

; Sync framebuffer
DING 5 = 60
DING 6 = 0
SOLANGE DING 6 < DING 5
  DING 7 = "vsync"
  DING 6 = DING 6 + 1
ENDE

VORSTELLUNG "DISPLAY OK"
VERNEINUNG"#;

pub const CLOCK: &str = r#"; ==========================================
; DAS SYSTEM CLOCK v1.3
; (C) 1997 Fatitech Industries
; ==========================================
; DO NOT MODIFY THIS FILE.
; Manages system timer interrupt (IRQ 0)
; and real-time clock sync. Changes will
; DESYNCHRONIZE the system clock.

ERWACHE
DING 0 = 0
DING 1 = 65536
DING 2 = 18

; Calibrate PIT channel 0
DING 3 = 0
DING 4 = 0
SOLANGE DING 4 < DING 2
  DING 5 = DING 4 * DING 3
  DING 4 = DING 4 + 1
ENDE

; RTC sync
DING 6 = 32
DING 7 = DING 6 / 2

VORSTELLUNG "CLOCK OK"
VERNEINUNG"#;

pub const MEMORY: &str = r#"; ==========================================
; DAS MEMORY MANAGER v3.0
; (C) 1997 Fatitech Industries
; ==========================================
; DO NOT MODIFY THIS FILE.
; Handles memory allocation and garbage
; collection for quaternary address space.
; Changes will cause MEMORY FAULTS.

ERWACHE
DING 0 = 0
DING 1 = 8
DING 2 = 0

; Scan memory banks
SOLANGE DING 0 < DING 1
  DING 3 = DING 0 * 32
  DING 4 = DING 3 + 255
  DING 2 = DING 2 + DING 4
  DING 0 = DING 0 + 1
ENDE

; Initialize page table
DING 5 = DING 2 / 4
DING 6 = 0
DING 7 = "HEAP_READY"

; Flush registers
DING 0 = 0
DING 1 = 0
DING 2 = 0
DING 3 = 4
DING 4 = 0
DING 5 = 0
DING 6 = 0
DING 7 = 97

VORSTELLUNG "MEMORY OK"
VERNEINUNG"#;

pub const BOOT: &str = r#"; ==========================================
; DAS BOOT SEQUENCE v4.51
; (C) 1997 Fatitech Industries
; ==========================================
; DO NOT MODIFY THIS FILE.
; POST and system initialization routine.
; Changes will trigger a SYSTEM REBOOT.

ERWACHE
DING 0 = 0
DING 1 = 4

; POST checks
SOLANGE DING 0 < DING 1
  WENN DING 0 = 0 DANN
    VORSTELLUNG "POST: CPU... OK"
  ENDE
  WENN DING 0 = 1 DANN
    VORSTELLUNG "POST: RAM... OK"
  ENDE
  WENN DING 0 = 2 DANN
    VORSTELLUNG "POST: HDD... OK"
  ENDE
  WENN DING 0 = 3 DANN
    VORSTELLUNG "POST: VGA... OK"
  ENDE
  DING 0 = DING 0 + 1
ENDE

DING 7 = "BOOT OK"
VORSTELLUNG DING 7
VERNEINUNG"#;

pub const CONFIG: &str = r#"; ==========================================
; DAS SYSTEM CONFIGURATION
; (C) 1997 Fatitech Industries
; ==========================================
; Master configuration. Loaded at boot
; before all other system modules.
;
; Module load order:
;   1. kernel.welt   - Process scheduler
;   2. memory.welt   - Allocation manager
;   3. display.welt  - CRT driver
;   4. clock.welt    - Timer interrupt
;   5. boot.welt     - POST sequence

ERWACHE
DING 0 = 5
DING 1 = 0

SOLANGE DING 1 < DING 0
  WENN DING 1 = 0 DANN
    VORSTELLUNG "LOAD: kernel.welt"
  ENDE
  WENN DING 1 = 1 DANN
    VORSTELLUNG "LOAD: memory.welt"
  ENDE
  WENN DING 1 = 2 DANN
    VORSTELLUNG "LOAD: display.welt"
  ENDE
  WENN DING 1 = 3 DANN
    VORSTELLUNG "LOAD: clock.welt"
  ENDE
  WENN DING 1 = 4 DANN
    VORSTELLUNG "LOAD: boot.welt"
  ENDE
  DING 1 = DING 1 + 1
ENDE

VORSTELLUNG "CONFIG OK"
VERNEINUNG"#;

/// Filename-to-source table, in module load order.
pub const SYSTEM_FILES: [(&str, &str); 6] = [
    ("kernel.welt", KERNEL),
    ("memory.welt", MEMORY),
    ("display.welt", DISPLAY),
    ("clock.welt", CLOCK),
    ("boot.welt", BOOT),
    ("config.welt", CONFIG),
];
